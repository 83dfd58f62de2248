//! Batch coordinator: one gated task per URL, wait for all of them.
//!
//! Jobs run concurrently up to the gate's capacity. The runner never
//! short-circuits: every job reaches a terminal outcome (or is recorded as
//! an internal failure if its task panicked) before `run` returns.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::fetcher::Fetcher;
use crate::gate::FetchGate;
use crate::outcome::{FailureKind, FetchOutcome, JobState};

/// One URL of a batch. Consumed by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlJob {
    /// Position in the input, used to report outcomes in input order.
    pub index: usize,
    pub url: String,
}

/// Outcomes of a finished batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, FetchOutcome)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcome of the first job with this URL.
    pub fn outcome(&self, url: &str) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, o)| o)
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Success { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Cancelled))
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Runs batches of URLs through one fetcher behind one gate.
pub struct BatchRunner {
    fetcher: Arc<Fetcher>,
    gate: Arc<FetchGate>,
}

impl BatchRunner {
    pub fn new(fetcher: Fetcher, gate: FetchGate) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            gate: Arc::new(gate),
        }
    }

    pub fn gate(&self) -> &FetchGate {
        &self.gate
    }

    /// Checks and downloads every URL. Returns once all jobs are terminal.
    ///
    /// Individual failures only show up in the report. `Err` means the batch
    /// could not start (the store failed to prepare its output location).
    /// An empty input returns at once without touching the gate, the
    /// network, or the store.
    pub async fn run<I, S>(&self, urls: I, cancel: &CancellationToken) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let jobs: Vec<UrlJob> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| UrlJob {
                index,
                url: url.into(),
            })
            .collect();
        if jobs.is_empty() {
            tracing::info!("no URLs to check");
            return Ok(BatchReport::default());
        }

        self.fetcher
            .store()
            .prepare()
            .await
            .context("failed to prepare output location")?;

        let started = Instant::now();
        tracing::info!(
            urls = jobs.len(),
            capacity = self.gate.capacity(),
            "starting to check and download URLs"
        );

        let mut slots: Vec<(String, Option<FetchOutcome>)> =
            jobs.iter().map(|job| (job.url.clone(), None)).collect();
        let mut join_set = JoinSet::new();
        for job in jobs {
            let fetcher = Arc::clone(&self.fetcher);
            let gate = Arc::clone(&self.gate);
            let cancel = cancel.clone();
            tracing::debug!(url = %job.url, state = %JobState::Pending, "job queued");
            join_set.spawn(async move {
                let outcome = run_job(&fetcher, &gate, &job, &cancel).await;
                (job.index, outcome)
            });
        }

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((index, outcome)) => slots[index].1 = Some(outcome),
                Err(e) => tracing::error!(error = %e, "job task failed"),
            }
        }

        let outcomes = slots
            .into_iter()
            .map(|(url, outcome)| {
                let outcome = outcome.unwrap_or_else(|| FetchOutcome::Failed {
                    kind: FailureKind::Internal,
                    message: "job task panicked".to_string(),
                    attempts: 0,
                });
                (url, outcome)
            })
            .collect();
        let report = BatchReport {
            outcomes,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "completed checking and downloading URLs"
        );
        Ok(report)
    }
}

/// Gate, fetch, release. The permit lives until this function returns or
/// unwinds.
async fn run_job(
    fetcher: &Fetcher,
    gate: &FetchGate,
    job: &UrlJob,
    cancel: &CancellationToken,
) -> FetchOutcome {
    tracing::debug!(url = %job.url, state = %JobState::Gated, "waiting for a gate slot");
    let _permit = match gate.acquire(cancel).await {
        Ok(permit) => permit,
        Err(_) => {
            tracing::info!(url = %job.url, "cancelled before start");
            return FetchOutcome::Cancelled;
        }
    };
    fetcher.fetch(&job.url, cancel).await
}
