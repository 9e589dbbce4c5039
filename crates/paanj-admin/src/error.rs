//! Admin core error types.

use thiserror::Error;

/// Error type shared by the admin core and every SDK built on it.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a config file.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// WebSocket transport failed.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// The event channel is not open.
    #[error("event channel is not connected")]
    NotConnected,

    /// A caller-supplied argument was rejected before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

/// Result type for admin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response from the server.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = Error::Api {
            status: 404,
            code: "not_found".to_string(),
            message: "missing".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(Error::NotFound("user u1".to_string()).is_not_found());

        assert!(Error::Auth("bad key".to_string()).is_auth_error());
        assert!(
            Error::Api {
                status: 429,
                code: String::new(),
                message: String::new(),
            }
            .is_rate_limited()
        );
        assert!(
            Error::Api {
                status: 503,
                code: String::new(),
                message: String::new(),
            }
            .is_server_error()
        );
        assert!(!Error::InvalidArgument("x".to_string()).is_server_error());
    }

    #[test]
    fn test_error_response_accepts_error_alias() {
        let body: ErrorResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("boom"));
        assert!(body.code.is_none());
    }
}
