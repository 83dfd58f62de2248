//! Shared test doubles: a scripted transport, a recording store, and a
//! local HTTP server.

#![allow(dead_code)]

pub mod page_server;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fetchgate_core::retry::{FetchError, RetryPolicy};
use fetchgate_core::storage::PageStore;
use fetchgate_core::transport::{HttpResponse, HttpTransport, ResponseBody};
use fetchgate_core::{BatchRunner, FetchGate, Fetcher};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How the scripted transport answers one URL.
#[derive(Debug, Clone)]
pub enum Script {
    /// Always this status and body.
    Status(u32, &'static str),
    /// One status per attempt; the last repeats.
    Sequence(Vec<u32>),
    /// Connection refused on every attempt.
    NetworkError,
    /// Never answers until cancelled.
    Hang,
}

/// In-memory transport answering from a per-URL script. Records every call
/// and the peak number of concurrent calls.
pub struct ScriptedTransport {
    scripts: HashMap<String, Script>,
    default: Script,
    latency: Duration,
    calls: Mutex<HashMap<String, Vec<Instant>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(default: Script) -> Self {
        Self {
            scripts: HashMap::new(),
            default,
            latency: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Times of each call for `url`, in order.
    pub fn calls_for(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse, FetchError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(url.to_string()).or_default();
            entry.push(Instant::now());
            entry.len()
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(self.latency) => {}
            }
        }

        let script = self.scripts.get(url).unwrap_or(&self.default);
        match script {
            Script::Status(status, body) => Ok(HttpResponse::new(
                *status,
                ResponseBody::from_bytes(body.as_bytes()),
            )),
            Script::Sequence(statuses) => {
                let status = statuses
                    .get(attempt - 1)
                    .or_else(|| statuses.last())
                    .copied()
                    .unwrap_or(200);
                Ok(HttpResponse::new(status, ResponseBody::from_bytes("page")))
            }
            // CURLE_COULDNT_CONNECT
            Script::NetworkError => Err(FetchError::Transport(curl::Error::new(7))),
            Script::Hang => {
                cancel.cancelled().await;
                Err(FetchError::Cancelled)
            }
        }
    }
}

/// Store that keeps pages in memory, or fails every write.
#[derive(Default)]
pub struct RecordingStore {
    pages: Mutex<Vec<(String, Vec<u8>)>>,
    persist_calls: AtomicUsize,
    prepare_calls: AtomicUsize,
    fail_writes: bool,
    fail_prepare: bool,
}

impl RecordingStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_prepare() -> Self {
        Self {
            fail_prepare: true,
            ..Self::default()
        }
    }

    pub fn pages(&self) -> Vec<(String, Vec<u8>)> {
        self.pages.lock().unwrap().clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn prepare_calls(&self) -> usize {
        self.prepare_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageStore for RecordingStore {
    async fn prepare(&self) -> Result<(), FetchError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_prepare {
            return Err(FetchError::Storage(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cannot create output directory",
            )));
        }
        Ok(())
    }

    async fn persist(&self, file_name: &str, body: ResponseBody) -> Result<u64, FetchError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(FetchError::Storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "File write failed",
            )));
        }
        let data = body.read_to_end().await?;
        let n = data.len() as u64;
        self.pages
            .lock()
            .unwrap()
            .push((file_name.to_string(), data));
        Ok(n)
    }
}

/// Runner over shared doubles so tests can inspect them afterwards.
pub fn runner(
    transport: &Arc<ScriptedTransport>,
    store: &Arc<RecordingStore>,
    capacity: usize,
) -> BatchRunner {
    let fetcher = Fetcher::new(
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        Arc::clone(store) as Arc<dyn PageStore>,
        RetryPolicy::default(),
    );
    BatchRunner::new(fetcher, FetchGate::new(capacity))
}
