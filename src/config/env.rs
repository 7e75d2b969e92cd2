use std::path::PathBuf;

use crate::error::DaisyconError;

use super::types::ClientConfig;

/// Expand environment variable references in a string.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - env var value, or fallback if unset or empty
/// - `$env:VAR` - same as `${VAR}`
pub fn expand_env_vars(input: &str) -> Result<String, DaisyconError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(body) = after.strip_prefix('{') {
            let close = body
                .find('}')
                .ok_or_else(|| env_error(&format!("Unclosed variable reference: ${{{body}")))?;
            let expr = &body[..close];
            match expr.split_once(":-") {
                Some((name, fallback)) => match std::env::var(name) {
                    Ok(val) if !val.is_empty() => result.push_str(&val),
                    _ => result.push_str(fallback),
                },
                None => result.push_str(&lookup(expr)?),
            }
            rest = &body[close + 1..];
        } else if let Some(body) = after.strip_prefix("env:") {
            let end = body
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(body.len());
            if end == 0 {
                return Err(env_error("Empty variable name in $env: reference"));
            }
            result.push_str(&lookup(&body[..end])?);
            rest = &body[end..];
        } else {
            result.push('$');
            rest = after;
        }
    }
    result.push_str(rest);

    Ok(result)
}

fn lookup(name: &str) -> Result<String, DaisyconError> {
    std::env::var(name)
        .map_err(|_| env_error(&format!("Environment variable '{name}' is not set")))
}

/// Expand environment variables in the string fields of a config.
pub fn expand_client_config(config: &mut ClientConfig) -> Result<(), DaisyconError> {
    config.client_id = expand_env_vars(&config.client_id)?;
    config.client_secret = expand_env_vars(&config.client_secret)?;
    config.redirect_uri = expand_env_vars(&config.redirect_uri)?;
    for url in [
        &mut config.base_url,
        &mut config.authorize_url,
        &mut config.token_url,
    ]
    .into_iter()
    .flatten()
    {
        *url = expand_env_vars(url.as_str())?;
    }
    if let Some(ref mut path) = config.token_path {
        *path = PathBuf::from(expand_env_vars(&path.to_string_lossy())?);
    }
    Ok(())
}

/// Apply `DAISYCON_*` environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut ClientConfig) {
    if let Ok(v) = std::env::var("DAISYCON_CLIENT_ID") {
        config.client_id = v;
    }
    if let Ok(v) = std::env::var("DAISYCON_CLIENT_SECRET") {
        config.client_secret = v;
    }
    if let Ok(v) = std::env::var("DAISYCON_REDIRECT_URI") {
        config.redirect_uri = v;
    }
    if let Ok(v) = std::env::var("DAISYCON_TOKEN_PATH") {
        config.token_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("DAISYCON_SANDBOX") {
        config.sandbox = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
}

fn env_error(detail: &str) -> DaisyconError {
    DaisyconError::ConfigError {
        path: PathBuf::from("<env>"),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_dollar_brace_var() {
        std::env::set_var("DAISYCON_TEST_VAR1", "hello");
        let result = expand_env_vars("prefix-${DAISYCON_TEST_VAR1}-suffix").unwrap();
        assert_eq!(result, "prefix-hello-suffix");
        std::env::remove_var("DAISYCON_TEST_VAR1");
    }

    #[test]
    fn expand_dollar_brace_unset_errors() {
        std::env::remove_var("DAISYCON_TEST_UNSET_XYZ");
        let err = expand_env_vars("${DAISYCON_TEST_UNSET_XYZ}").unwrap_err();
        assert!(err.to_string().contains("DAISYCON_TEST_UNSET_XYZ"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn expand_fallback_when_unset() {
        std::env::remove_var("DAISYCON_TEST_FB_UNSET");
        let result = expand_env_vars("${DAISYCON_TEST_FB_UNSET:-default_val}").unwrap();
        assert_eq!(result, "default_val");
    }

    #[test]
    fn expand_fallback_when_empty() {
        std::env::set_var("DAISYCON_TEST_FB_EMPTY", "");
        let result = expand_env_vars("${DAISYCON_TEST_FB_EMPTY:-fallback}").unwrap();
        assert_eq!(result, "fallback");
        std::env::remove_var("DAISYCON_TEST_FB_EMPTY");
    }

    #[test]
    fn expand_env_colon_var() {
        std::env::set_var("DAISYCON_TEST_ENV_COLON", "envval");
        let result = expand_env_vars("secret-$env:DAISYCON_TEST_ENV_COLON/x").unwrap();
        assert_eq!(result, "secret-envval/x");
        std::env::remove_var("DAISYCON_TEST_ENV_COLON");
    }

    #[test]
    fn unclosed_brace_errors() {
        let err = expand_env_vars("${NEVER_CLOSED").unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(expand_env_vars("cost $5").unwrap(), "cost $5");
        assert_eq!(expand_env_vars("plain").unwrap(), "plain");
    }

    #[test]
    fn expand_client_config_fields() {
        std::env::set_var("DAISYCON_TEST_CC_ID", "client-42");
        std::env::set_var("DAISYCON_TEST_CC_SECRET", "s3cret");
        let mut cfg = ClientConfig {
            client_id: "${DAISYCON_TEST_CC_ID}".into(),
            client_secret: "$env:DAISYCON_TEST_CC_SECRET".into(),
            redirect_uri: "${DAISYCON_TEST_CC_REDIRECT:-http://localhost:8765/callback}".into(),
            base_url: Some("${DAISYCON_TEST_CC_BASE:-https://api.example.com}".into()),
            ..Default::default()
        };
        expand_client_config(&mut cfg).unwrap();
        assert_eq!(cfg.client_id, "client-42");
        assert_eq!(cfg.client_secret, "s3cret");
        assert_eq!(cfg.redirect_uri, "http://localhost:8765/callback");
        assert_eq!(cfg.base_url.as_deref(), Some("https://api.example.com"));
        std::env::remove_var("DAISYCON_TEST_CC_ID");
        std::env::remove_var("DAISYCON_TEST_CC_SECRET");
    }
}
