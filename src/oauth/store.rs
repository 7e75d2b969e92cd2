use std::path::{Path, PathBuf};

use crate::error::DaisyconError;
use crate::oauth::token::TokenSet;

/// A token file on disk.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored tokens. A missing or unparsable file yields `None`.
    pub fn load(&self) -> Option<TokenSet> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&data) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!("Ignoring unparsable token file {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Write to a sibling temp file, then rename over the old one.
    pub fn save(&self, token: &TokenSet) -> Result<(), DaisyconError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(token)
            .map_err(|e| DaisyconError::OAuthError(format!("Failed to serialize token: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<(), DaisyconError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
