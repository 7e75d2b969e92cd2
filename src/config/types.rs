use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const PRODUCTION_BASE_URL: &str = "https://services.daisycon.com";
pub const SANDBOX_BASE_URL: &str = "https://services.daisycon.com";
pub const AUTHORIZE_URL: &str = "https://login.daisycon.com/oauth/authorize";
pub const TOKEN_URL: &str = "https://login.daisycon.com/oauth/access-token";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// OAuth client credentials. Fixed for the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Which API host requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    #[serde(default)]
    pub sandbox: bool,
    /// Overrides the environment's API host.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Development only. Disables TLS certificate verification.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn credential(&self) -> Credential {
        Credential {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }

    pub fn environment(&self) -> Environment {
        if self.sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment().base_url())
    }

    pub fn authorize_url(&self) -> &str {
        self.authorize_url.as_deref().unwrap_or(AUTHORIZE_URL)
    }

    pub fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(TOKEN_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(default_token_path)
    }
}

pub fn default_token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".daisycon")
        .join("token.json")
}
