//! Fetch error type for retry classification.

use thiserror::Error;

/// Error from one fetch attempt or from persisting its body.
/// Kept as a concrete enum so the retry loop can classify it before it is
/// turned into a reported outcome.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or is not http(s).
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{0}")]
    Transport(#[from] curl::Error),
    /// Response status the retry loop treats as a failure (408, 5xx).
    #[error("HTTP {0}")]
    Http(u32),
    /// The response body stream broke without a transport error.
    #[error("response body: {0}")]
    Body(String),
    /// Disk/storage write failed (e.g. disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The batch was cancelled while this job was waiting or running.
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
