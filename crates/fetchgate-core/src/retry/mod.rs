//! Retry and backoff policy.
//!
//! Error classification (network failures, timeouts, 408, 5xx) and the
//! exponential backoff loop shared by every fetch in a batch.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Attempted, RetryError};
