use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Credential;
use crate::error::DaisyconError;

/// Tokens are refreshed this long before their `exp` claim.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Tokens as returned by the token endpoint and persisted to disk.
///
/// Fields other than the two tokens are kept as-is so the file round-trips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Valid,
    ExpiringSoon,
}

impl TokenSet {
    /// The `exp` claim of the access token's JWT payload.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.access_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?;
        let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Validity at `now`: `exp - margin` must still lie in the future.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        let usable_until = self
            .expires_at()
            .and_then(|exp| exp.checked_sub_signed(Duration::seconds(EXPIRY_MARGIN_SECS)));
        match usable_until {
            None => TokenState::Absent,
            Some(until) if until > now => TokenState::Valid,
            Some(_) => TokenState::ExpiringSoon,
        }
    }

    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }
}

/// Exchange an authorization code (plus PKCE verifier) for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    token_url: &str,
    credential: &Credential,
    code: &str,
    code_verifier: &str,
) -> Result<TokenSet, DaisyconError> {
    request_tokens(
        http,
        token_url,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("redirect_uri", credential.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ],
        "Token exchange",
    )
    .await
}

pub async fn refresh_token(
    http: &reqwest::Client,
    token_url: &str,
    credential: &Credential,
    refresh_tok: &str,
) -> Result<TokenSet, DaisyconError> {
    request_tokens(
        http,
        token_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_tok),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("redirect_uri", credential.redirect_uri.as_str()),
        ],
        "Token refresh",
    )
    .await
}

async fn request_tokens(
    http: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
    what: &str,
) -> Result<TokenSet, DaisyconError> {
    let resp = http
        .post(token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| DaisyconError::OAuthError(format!("{what} request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(DaisyconError::OAuthError(format!(
            "{what} failed with status {status}: {body}"
        )));
    }

    resp.json::<TokenSet>()
        .await
        .map_err(|e| DaisyconError::OAuthError(format!("Failed to parse {what} response: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned JWT whose payload carries the given `exp`.
    pub(crate) fn jwt_expiring_at(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }

    fn token_with_exp(exp: i64) -> TokenSet {
        TokenSet {
            access_token: jwt_expiring_at(exp),
            refresh_token: Some("refresh".into()),
            extra: Map::new(),
        }
    }

    #[test]
    fn decodes_exp_claim() {
        let token = token_with_exp(1_700_000_000);
        assert_eq!(token.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn valid_when_expiry_beyond_margin() {
        let now = Utc::now();
        let token = token_with_exp(now.timestamp() + 301);
        assert_eq!(token.state_at(now), TokenState::Valid);
    }

    #[test]
    fn expiring_soon_inside_margin() {
        let now = Utc::now();
        let token = token_with_exp(now.timestamp() + 299);
        assert_eq!(token.state_at(now), TokenState::ExpiringSoon);
    }

    #[test]
    fn expiring_soon_exactly_at_margin() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let token = token_with_exp(1_800_000_300);
        assert_eq!(token.state_at(now), TokenState::ExpiringSoon);
    }

    #[test]
    fn expiry_at_the_calendar_minimum_is_absent() {
        let token = token_with_exp(DateTime::<Utc>::MIN_UTC.timestamp());
        assert!(token.expires_at().is_some());
        assert_eq!(token.state(), TokenState::Absent);
    }

    #[test]
    fn opaque_access_token_is_absent() {
        let token = TokenSet {
            access_token: "not-a-jwt".into(),
            refresh_token: None,
            extra: Map::new(),
        };
        assert!(token.expires_at().is_none());
        assert_eq!(token.state(), TokenState::Absent);
    }

    #[test]
    fn extra_fields_round_trip() {
        let json = r#"{
            "access_token": "a.b.c",
            "refresh_token": "r",
            "token_type": "Bearer",
            "expires_in": 1800
        }"#;
        let token: TokenSet = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
        assert_eq!(token.extra["token_type"], "Bearer");

        let back = serde_json::to_value(&token).unwrap();
        assert_eq!(back["expires_in"], 1800);
        assert_eq!(back["access_token"], "a.b.c");
    }
}
