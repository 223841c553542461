//! Backend error types.

use thiserror::Error;

/// Backend error type.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service returned an error response.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error type reported by the service (`__type`).
        code: String,
        /// Error message from the service.
        message: String,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Build an API error, as the service would report it.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error type reported by the service, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True when the service could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BackendError::Http(e) if e.is_connect() || e.is_timeout())
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, BackendError::Api { status, .. } if *status >= 500)
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Error body returned by the service.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(rename = "__type", default)]
    pub code: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_code() {
        let err = BackendError::api(400, "AccessDeniedException", "role not assumable");
        assert_eq!(err.code(), Some("AccessDeniedException"));
        assert!(!err.is_server_error());
        assert!(!err.is_unreachable());
        assert_eq!(
            err.to_string(),
            "API error (400) AccessDeniedException: role not assumable"
        );
    }

    #[test]
    fn test_server_error() {
        assert!(BackendError::api(503, "ServiceUnavailable", "busy").is_server_error());
        assert_eq!(BackendError::Config("x".into()).code(), None);
    }
}
