pub mod args;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod request;
pub mod resolver;

pub use client::{ApiResponse, Client};
pub use config::{load_config, ClientConfig, Credential, Environment};
pub use error::DaisyconError;
pub use oauth::{Handshake, TokenManager, TokenSet, TokenState};
pub use request::{build_request, Collection, Method, Request, RequestBuilder};
pub use resolver::resolve;

/// One-shot convenience function: load config, resolve and execute a call.
pub async fn call_once(
    name: &str,
    args: &[serde_json::Value],
) -> Result<Option<serde_json::Value>, DaisyconError> {
    let client = Client::from_config(None)?;
    client.call(name, args).await
}
