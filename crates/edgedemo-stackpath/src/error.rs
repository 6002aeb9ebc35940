//! StackPath API error types

use edgedemo_monitor::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackPathError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Any response with a status of 300 or above
    #[error("{status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StackPathError {
    /// HTTP status of an API error response
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            StackPathError::Api { status, .. } => Some(*status),
            StackPathError::Http(err) => err.status(),
            _ => None,
        }
    }
}

impl From<StackPathError> for FetchError {
    fn from(err: StackPathError) -> Self {
        FetchError::new(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StackPathError>;
