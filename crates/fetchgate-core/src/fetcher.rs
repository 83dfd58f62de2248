//! Fetch one URL: GET with retry, check the status, stream the page to the store.
//!
//! Every error is turned into a `FetchOutcome` here; nothing propagates to
//! the batch or to sibling jobs.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::outcome::{FetchOutcome, JobState};
use crate::retry::{
    classify_http_status, run_with_retry, Attempted, FetchError, RetryError, RetryPolicy,
};
use crate::storage::PageStore;
use crate::transport::{HttpResponse, HttpTransport};
use crate::url_model::{page_file_name, parse_page_url};

/// Fetch-and-persist for single URLs. Cheap to share between jobs.
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn PageStore>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn PageStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// Fetches `url` and, on a 2xx status, persists the body.
    ///
    /// - 2xx → `Success`
    /// - 408/5xx/network errors → retried, then `Failed`
    /// - other statuses → `Skipped`, nothing written
    /// - storage errors → `Failed`, not retried
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let span = tracing::info_span!("fetch", url = %url);
        let outcome = self.fetch_page(url, cancel).instrument(span.clone()).await;
        span.in_scope(|| log_outcome(url, &outcome));
        outcome
    }

    async fn fetch_page(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        if let Err(e) = parse_page_url(url) {
            return FetchOutcome::failed(&e, 0);
        }
        let url = url.trim();
        tracing::info!("checking URL");

        let response = match self.get_with_retry(url, cancel).await {
            Ok(done) => done,
            Err(RetryError { error, .. }) if error.is_cancelled() => {
                return FetchOutcome::Cancelled
            }
            Err(RetryError { error, attempts }) => return FetchOutcome::failed(&error, attempts),
        };
        let Attempted {
            value: response,
            attempts,
        } = response;

        if !response.is_success() {
            // Dropping the body aborts the transfer.
            return FetchOutcome::Skipped {
                status: response.status,
                attempts,
            };
        }

        tracing::info!(status = response.status, "URL exists and is being downloaded");
        let file = page_file_name(url);
        let persisted = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            r = self.store.persist(&file, response.body) => r,
        };
        match persisted {
            Ok(bytes_written) => FetchOutcome::Success {
                file,
                bytes_written,
                attempts,
            },
            Err(e) if e.is_cancelled() => FetchOutcome::Cancelled,
            Err(e) => FetchOutcome::failed(&e, attempts),
        }
    }

    /// GET under the retry policy. Retryable statuses (408, 5xx) count as
    /// failed attempts; any other status ends the loop.
    async fn get_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Attempted<HttpResponse>, RetryError> {
        let transport = &self.transport;
        run_with_retry(&self.policy, cancel, move |attempt| async move {
            let state = if attempt == 1 {
                JobState::Fetching
            } else {
                JobState::Retrying
            };
            tracing::debug!(%state, attempt, "sending GET");
            let response = transport.get(url, cancel).await?;
            if classify_http_status(response.status).is_transient() {
                return Err(FetchError::Http(response.status));
            }
            Ok(response)
        })
        .await
    }
}

fn log_outcome(url: &str, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Success {
            file,
            bytes_written,
            attempts,
        } => tracing::info!(
            file = %file,
            bytes = bytes_written,
            attempts,
            "successfully downloaded and saved {}",
            url
        ),
        FetchOutcome::Skipped { status, .. } => {
            tracing::warn!(status, "URL check failed: {} with status code {}", url, status)
        }
        FetchOutcome::Failed {
            kind,
            message,
            attempts,
        } => tracing::error!(
            kind = %kind,
            attempts,
            "error checking or downloading URL: {}, error: {}",
            url,
            message
        ),
        FetchOutcome::Cancelled => tracing::info!("cancelled: {}", url),
    }
    tracing::debug!(state = %JobState::Terminal, "job finished");
}
