//! Data access error types.

use thiserror::Error;

/// Errors that can occur when reading from the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not complete (DNS, connection, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// The backend answered but signaled failure, either with a non-2xx
    /// status or with `success: false` in the envelope.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// The payload could not be decoded into the requested type.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// The locator could not be turned into a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Human-readable message for display.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status for application failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
