use std::path::PathBuf;

use crate::oauth::Handshake;

#[derive(Debug, thiserror::Error)]
pub enum DaisyconError {
    #[error("Unknown method '{name}'{}", format_suggestion(.suggestion.as_deref()))]
    UnknownMethod {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Call to '{collection}' requires a positive numeric id, got {got}")]
    MissingIdentifier { collection: String, got: String },

    #[error("Invalid path segment '{segment}'")]
    InvalidSegment { segment: String },

    #[error("Bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Forbidden ({status}): {message}")]
    Forbidden { status: u16, message: String },

    #[error("Not found ({status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("{} ({status}): {message}", internal_label(.status))]
    InternalServer { status: u16, message: String },

    #[error("Unsupported HTTP status {status}: {message}")]
    UnsupportedStatus { status: u16, message: String },

    #[error("Authentication required. Visit: {}", .handshake.authorize_url)]
    AuthRequired { handshake: Box<Handshake> },

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Transport error: {0}")]
    TransportError(Box<dyn std::error::Error + Send + Sync>),

    #[error("OAuth error: {0}")]
    OAuthError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_suggestion(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}

fn internal_label(status: &u16) -> &'static str {
    if *status == 503 {
        "Service unavailable"
    } else {
        "Internal server error"
    }
}

impl From<reqwest::Error> for DaisyconError {
    fn from(e: reqwest::Error) -> Self {
        DaisyconError::TransportError(Box::new(e))
    }
}

impl DaisyconError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            DaisyconError::UnknownMethod { .. } => "unknown_method",
            DaisyconError::MissingIdentifier { .. } => "missing_identifier",
            DaisyconError::InvalidSegment { .. } => "invalid_segment",
            DaisyconError::BadRequest { .. } => "bad_request",
            DaisyconError::Forbidden { .. } => "forbidden",
            DaisyconError::NotFound { .. } => "not_found",
            DaisyconError::InternalServer { .. } => "internal_server_error",
            DaisyconError::UnsupportedStatus { .. } => "unsupported_status",
            DaisyconError::AuthRequired { .. } => "auth_required",
            DaisyconError::ConfigError { .. } => "config_error",
            DaisyconError::TransportError(_) => "transport_error",
            DaisyconError::OAuthError(_) => "oauth_error",
            DaisyconError::IoError(_) => "io_error",
        }
    }

    /// HTTP status carried by transport-level errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            DaisyconError::BadRequest { status, .. }
            | DaisyconError::Forbidden { status, .. }
            | DaisyconError::NotFound { status, .. }
            | DaisyconError::InternalServer { status, .. }
            | DaisyconError::UnsupportedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status));
        }
        if let DaisyconError::AuthRequired { handshake } = self {
            obj.insert(
                "authorizeUrl".into(),
                serde_json::Value::String(handshake.authorize_url.clone()),
            );
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
