pub mod callback;
pub mod flow;
pub mod pkce;
pub mod store;
pub mod token;

pub use callback::listen_for_callback;
pub use flow::{begin_handshake, Handshake, TokenManager};
pub use pkce::{challenge_for, PkcePair};
pub use store::TokenStore;
pub use token::{exchange_code, refresh_token, TokenSet, TokenState, EXPIRY_MARGIN_SECS};
