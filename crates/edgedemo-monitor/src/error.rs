//! Monitor error types

use thiserror::Error;

/// A failed call against the remote platform.
///
/// Network failures, non-2xx responses and undecodable payloads all collapse
/// into this single kind; monitors treat them identically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FetchError(String);

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors that end a monitor loop
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{monitor} monitor: fetch failed: {source}")]
    Fetch {
        monitor: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("{monitor} monitor: fetch failed for {key}: {source}")]
    FetchItem {
        monitor: &'static str,
        key: String,
        #[source]
        source: FetchError,
    },
}

impl MonitorError {
    /// Name of the monitor that failed
    pub fn monitor(&self) -> &'static str {
        match self {
            MonitorError::Fetch { monitor, .. } | MonitorError::FetchItem { monitor, .. } => {
                monitor
            }
        }
    }

    /// Item key the failure is attributed to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            MonitorError::Fetch { .. } => None,
            MonitorError::FetchItem { key, .. } => Some(key),
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
