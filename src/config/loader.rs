use std::path::{Path, PathBuf};

use crate::error::DaisyconError;

use super::env::{apply_env_overrides, expand_client_config};
use super::types::ClientConfig;

/// Locate the config file.
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `DAISYCON_CONFIG` env var
/// 3. `~/.daisycon/config.json`
///
/// Returns `None` when no candidate exists; the client then runs on
/// defaults plus environment overrides.
pub fn discover_config_file(cli_config: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        return Some(PathBuf::from(path));
    }
    if let Ok(env_path) = std::env::var("DAISYCON_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    let home = dirs::home_dir()?.join(".daisycon").join("config.json");
    home.exists().then_some(home)
}

pub fn load_config_file(path: &Path) -> Result<ClientConfig, DaisyconError> {
    let content = std::fs::read_to_string(path).map_err(|e| DaisyconError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    serde_json::from_str::<ClientConfig>(&content).map_err(|e| DaisyconError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Load the config file (if any), expand `${VAR}` references, then apply
/// `DAISYCON_*` environment overrides.
pub fn load_config(cli_config: Option<&str>) -> Result<ClientConfig, DaisyconError> {
    let mut config = match discover_config_file(cli_config) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)?
        }
        None => ClientConfig::default(),
    };

    expand_client_config(&mut config)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_used_even_if_missing() {
        let found = discover_config_file(Some("/nonexistent/daisycon.json"));
        assert_eq!(found, Some(PathBuf::from("/nonexistent/daisycon.json")));
    }

    #[test]
    fn load_config_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"clientId": "id-1", "clientSecret": "sec", "redirectUri": "https://example.com/cb"}"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.client_id, "id-1");
        assert_eq!(config.redirect_uri, "https://example.com/cb");
    }

    #[test]
    fn load_config_file_error_on_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not valid json at all").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn load_config_file_error_on_missing_file() {
        let err = load_config_file(Path::new("/nonexistent/file.json")).unwrap_err();
        assert!(err.to_string().contains("Cannot read file"));
    }

    #[test]
    fn load_config_expands_env_references() {
        std::env::set_var("DAISYCON_TEST_LOADER_SECRET", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"clientId": "id-2", "clientSecret": "${DAISYCON_TEST_LOADER_SECRET}"}"#,
        )
        .unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.client_secret, "from-env");
        std::env::remove_var("DAISYCON_TEST_LOADER_SECRET");
    }
}
