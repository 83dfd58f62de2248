//! `fetchgate fetch` – run one batch and print a per-URL summary.

use anyhow::Result;
use fetchgate_core::config::FetchgateConfig;
use fetchgate_core::input;
use fetchgate_core::retry::RetryPolicy;
use fetchgate_core::storage::FsPageStore;
use fetchgate_core::transport::CurlTransport;
use fetchgate_core::{BatchReport, BatchRunner, FetchGate, FetchOutcome, Fetcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Command-line overrides for one batch.
#[derive(Debug, Default)]
pub struct FetchRequest {
    pub urls: Vec<String>,
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
}

/// Settings after applying command-line overrides to the config.
#[derive(Debug, PartialEq)]
pub(crate) struct BatchSettings {
    pub output_dir: PathBuf,
    pub capacity: usize,
    pub policy: RetryPolicy,
}

pub(crate) fn batch_settings(cfg: &FetchgateConfig, request: &FetchRequest) -> BatchSettings {
    let mut policy = cfg.retry_policy();
    if let Some(n) = request.max_attempts {
        policy.max_attempts = n.max(1);
    }
    BatchSettings {
        output_dir: request
            .output_dir
            .clone()
            .unwrap_or_else(|| cfg.output_dir.clone()),
        capacity: request.concurrency.unwrap_or(cfg.max_concurrent).max(1),
        policy,
    }
}

pub async fn run_fetch(cfg: &FetchgateConfig, request: FetchRequest) -> Result<()> {
    let urls = input::resolve_urls(
        &request.urls,
        request.input.as_deref(),
        cfg.urls.as_deref(),
    )?;
    let settings = batch_settings(cfg, &request);

    let store = FsPageStore::new(&settings.output_dir);
    let fetcher = Fetcher::new(
        Arc::new(CurlTransport::new(cfg.curl_options())),
        Arc::new(store.clone()),
        settings.policy,
    );
    let runner = BatchRunner::new(fetcher, FetchGate::new(settings.capacity));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling batch");
                cancel.cancel();
            }
        })
    };

    let report = runner.run(urls, &cancel).await?;
    interrupt.abort();

    print_report(&report, store.dir());
    Ok(())
}

fn print_report(report: &BatchReport, output_dir: &Path) {
    if report.is_empty() {
        println!("No URLs to fetch.");
        return;
    }
    for (url, outcome) in &report.outcomes {
        println!("  {:<9} {}  {}", label(outcome), url, outcome);
    }
    println!(
        "{} saved, {} skipped, {} failed, {} cancelled in {:.1}s (pages in {})",
        report.succeeded(),
        report.skipped(),
        report.failed(),
        report.cancelled(),
        report.elapsed.as_secs_f64(),
        output_dir.display()
    );
}

pub(crate) fn label(outcome: &FetchOutcome) -> &'static str {
    match outcome {
        FetchOutcome::Success { .. } => "[ok]",
        FetchOutcome::Skipped { .. } => "[skip]",
        FetchOutcome::Failed { .. } => "[fail]",
        FetchOutcome::Cancelled => "[cancel]",
    }
}
