use crate::config::{ClientConfig, Credential};
use crate::error::DaisyconError;
use crate::oauth::pkce::{random_token, PkcePair};
use crate::oauth::store::TokenStore;
use crate::oauth::token::{exchange_code, refresh_token, TokenSet, TokenState};

/// An authorization request in flight.
///
/// The caller keeps this value until the redirect delivers a code, then
/// hands both to [`TokenManager::complete_handshake`].
#[derive(Debug, Clone)]
pub struct Handshake {
    pub authorize_url: String,
    pub code_verifier: String,
    pub state: String,
    pub redirect_uri: String,
}

/// Build the authorization URL for an authorization-code-with-PKCE flow.
pub fn begin_handshake(
    authorize_endpoint: &str,
    credential: &Credential,
) -> Result<Handshake, DaisyconError> {
    let pkce = PkcePair::generate();
    let state = random_token(16);
    let url = url::Url::parse_with_params(
        authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", credential.client_id.as_str()),
            ("redirect_uri", credential.redirect_uri.as_str()),
            ("code_challenge", pkce.code_challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| {
        DaisyconError::OAuthError(format!(
            "Invalid authorization endpoint '{authorize_endpoint}': {e}"
        ))
    })?;

    Ok(Handshake {
        authorize_url: url.into(),
        code_verifier: pkce.code_verifier,
        state,
        redirect_uri: credential.redirect_uri.clone(),
    })
}

/// Owns the token file and keeps a usable access token on hand.
#[derive(Debug, Clone)]
pub struct TokenManager {
    credential: Credential,
    authorize_url: String,
    token_url: String,
    store: TokenStore,
    http: reqwest::Client,
}

impl TokenManager {
    pub fn new(config: &ClientConfig, http: reqwest::Client) -> Self {
        Self {
            credential: config.credential(),
            authorize_url: config.authorize_url().to_string(),
            token_url: config.token_url().to_string(),
            store: TokenStore::new(config.token_path()),
            http,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn handshake(&self) -> Result<Handshake, DaisyconError> {
        begin_handshake(&self.authorize_url, &self.credential)
    }

    /// Current state of the stored token, without touching the network.
    pub fn state(&self) -> TokenState {
        self.store
            .load()
            .map(|t| t.state())
            .unwrap_or(TokenState::Absent)
    }

    /// Return a valid access token, refreshing it first when it is about
    /// to expire.
    ///
    /// A failed refresh deletes the token file and asks for a new
    /// authorization, the same as a missing token.
    pub async fn bearer(&self) -> Result<String, DaisyconError> {
        let Some(token) = self.store.load() else {
            tracing::debug!("No token at {}", self.store.path().display());
            return Err(self.auth_required());
        };

        match token.state() {
            TokenState::Valid => Ok(token.access_token),
            TokenState::Absent => {
                tracing::debug!("Stored access token has no readable expiry");
                Err(self.auth_required())
            }
            TokenState::ExpiringSoon => match self.refresh(&token).await {
                Ok(fresh) => Ok(fresh.access_token),
                Err(e) => {
                    tracing::warn!("Token refresh failed, re-authorization needed: {e}");
                    if let Err(e) = self.store.remove() {
                        tracing::warn!(
                            "Failed to remove token file {}: {e}",
                            self.store.path().display()
                        );
                    }
                    Err(self.auth_required())
                }
            },
        }
    }

    /// Exchange the code from a finished handshake and persist the tokens.
    pub async fn complete_handshake(
        &self,
        handshake: &Handshake,
        code: &str,
    ) -> Result<TokenSet, DaisyconError> {
        let token = exchange_code(
            &self.http,
            &self.token_url,
            &self.credential,
            code,
            &handshake.code_verifier,
        )
        .await?;
        self.store.save(&token)?;
        Ok(token)
    }

    async fn refresh(&self, current: &TokenSet) -> Result<TokenSet, DaisyconError> {
        let refresh_tok = current.refresh_token.as_deref().ok_or_else(|| {
            DaisyconError::OAuthError("Stored token has no refresh token".to_string())
        })?;
        tracing::debug!("Refreshing access token");

        let mut fresh = refresh_token(&self.http, &self.token_url, &self.credential, refresh_tok)
            .await?;
        if fresh.refresh_token.is_none() {
            fresh.refresh_token = current.refresh_token.clone();
        }
        self.store.save(&fresh)?;
        Ok(fresh)
    }

    fn auth_required(&self) -> DaisyconError {
        match self.handshake() {
            Ok(handshake) => DaisyconError::AuthRequired {
                handshake: Box::new(handshake),
            },
            Err(e) => e,
        }
    }
}
