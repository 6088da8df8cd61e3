//! Generation provider errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Endpoint or API key missing
    #[error("generation API credentials are not configured")]
    MissingCredentials,

    /// Connection, timeout or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        error_status: Option<String>,
    },

    /// Success status but the body was not the expected JSON
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The request hit the client's connect or total timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Http(e) if e.is_timeout())
    }
}
