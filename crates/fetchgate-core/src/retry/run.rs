//! Retry loop: run an attempt until it succeeds, fails permanently, or the
//! policy says stop.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Value produced by the attempt that ended the loop.
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Terminal error of a retry loop with the number of attempts made.
#[derive(Debug)]
pub struct RetryError {
    pub error: FetchError,
    pub attempts: u32,
}

/// Runs `attempt_fn` until it returns `Ok`, returns a non-transient error, or
/// `policy.max_attempts` is reached. On a transient failure waits for the
/// policy's backoff, then tries again.
///
/// `attempt_fn` receives the 1-based attempt number. Cancelling `cancel`
/// abandons the in-flight attempt or backoff sleep and yields
/// `FetchError::Cancelled` without further attempts.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> Result<Attempted<T>, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1u32;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            r = attempt_fn(attempt) => r,
        };

        let error = match result {
            Ok(value) => {
                return Ok(Attempted {
                    value,
                    attempts: attempt,
                })
            }
            Err(e) => e,
        };
        if error.is_cancelled() {
            return Err(RetryError {
                error,
                attempts: attempt,
            });
        }

        match policy.decide(attempt, classify::classify(&error)) {
            RetryDecision::NoRetry => {
                return Err(RetryError {
                    error,
                    attempts: attempt,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(RetryError {
                            error: FetchError::Cancelled,
                            attempts: attempt,
                        });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}
