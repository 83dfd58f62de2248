//! libcurl-backed transport.
//!
//! libcurl's easy interface blocks, so each GET runs on tokio's blocking
//! pool. The final status travels back over a oneshot as soon as the header
//! block of the final response ends; body chunks follow over a bounded
//! channel. The transfer aborts when the batch is cancelled or when the
//! receiver drops the body.

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use async_trait::async_trait;
use curl::easy::Easy;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::body::{BodyChunk, ResponseBody, BODY_CHANNEL_CAPACITY};
use super::{HttpResponse, HttpTransport};
use crate::retry::FetchError;

/// Per-request curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer limit, body included.
    pub timeout: Duration,
    /// Abort when the transfer stays under 1 byte/s for this long.
    pub low_speed_time: Duration,
    pub max_redirections: u32,
    pub user_agent: String,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
            user_agent: concat!("fetchgate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

type StatusSender = oneshot::Sender<Result<u32, FetchError>>;

#[async_trait]
impl HttpTransport for CurlTransport {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse, FetchError> {
        let (status_tx, status_rx) = oneshot::channel();
        let (body_tx, body) = ResponseBody::channel(BODY_CHANNEL_CAPACITY);
        let url = url.to_string();
        let opts = self.opts.clone();
        let worker_cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            perform_get(&url, &opts, &worker_cancel, status_tx, body_tx)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            status = status_rx => match status {
                Ok(Ok(status)) => Ok(HttpResponse::new(status, body)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(FetchError::Body(
                    "transfer worker exited before the status line".to_string(),
                )),
            },
        }
    }
}

/// Runs one blocking GET. Whatever happens, the status channel is answered
/// exactly once; a failure after the status went out goes down the body.
fn perform_get(
    url: &str,
    opts: &CurlOptions,
    cancel: &CancellationToken,
    status_tx: StatusSender,
    body_tx: mpsc::Sender<BodyChunk>,
) {
    let status_tx = RefCell::new(Some(status_tx));
    let result = run_transfer(url, opts, cancel, &status_tx, &body_tx);
    let pending = status_tx.borrow_mut().take();

    match result {
        Ok(code) => {
            if let Some(tx) = pending {
                let _ = tx.send(Ok(code));
            }
        }
        Err(e) => {
            let e = if cancel.is_cancelled() {
                FetchError::Cancelled
            } else {
                e
            };
            match pending {
                Some(tx) => {
                    let _ = tx.send(Err(e));
                }
                None => {
                    // Receiver may already be gone (skipped page, cancelled job).
                    let _ = body_tx.blocking_send(Err(e));
                }
            }
        }
    }
}

fn run_transfer(
    url: &str,
    opts: &CurlOptions,
    cancel: &CancellationToken,
    status_tx: &RefCell<Option<StatusSender>>,
    body_tx: &mpsc::Sender<BodyChunk>,
) -> Result<u32, FetchError> {
    let mut easy = Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirections)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.low_speed_limit(1)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.useragent(&opts.user_agent)?;
    easy.progress(true)?;

    let block = RefCell::new(HeaderBlock::new(true));
    let send_status = |code: u32| {
        if let Some(tx) = status_tx.borrow_mut().take() {
            let _ = tx.send(Ok(code));
        }
    };
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Some(code) = block.borrow_mut().feed(line) {
                send_status(code);
            }
            true
        })?;
        transfer.write_function(|data| {
            // Servers that never end their headers cleanly still get a status.
            send_status(block.borrow().status);
            if cancel.is_cancelled() {
                return Ok(0);
            }
            match body_tx.blocking_send(Ok(data.to_vec())) {
                Ok(()) => Ok(data.len()),
                Err(_) => Ok(0), // body dropped: abort transfer
            }
        })?;
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled() && !body_tx.is_closed())?;
        transfer.perform()?;
    }

    Ok(easy.response_code()?)
}

/// Tracks one response header block at a time.
///
/// `feed` returns the status once the block of the final response ends:
/// interim 1xx blocks and redirects curl is about to follow are skipped.
#[derive(Debug)]
struct HeaderBlock {
    follow_redirects: bool,
    status: u32,
    has_location: bool,
}

impl HeaderBlock {
    fn new(follow_redirects: bool) -> Self {
        Self {
            follow_redirects,
            status: 0,
            has_location: false,
        }
    }

    fn feed(&mut self, line: &[u8]) -> Option<u32> {
        if let Some(code) = parse_status_line(line) {
            self.status = code;
            self.has_location = false;
            return None;
        }
        if line == b"\r\n" || line == b"\n" {
            let status = self.status;
            let interim = (100..200).contains(&status);
            let followed =
                self.follow_redirects && (300..400).contains(&status) && self.has_location;
            return (status != 0 && !interim && !followed).then_some(status);
        }
        if line.len() >= 9 && line[..9].eq_ignore_ascii_case(b"location:") {
            self.has_location = true;
        }
        None
    }
}

/// Status code from a header line like `HTTP/1.1 404 Not Found`.
fn parse_status_line(line: &[u8]) -> Option<u32> {
    let line = str::from_utf8(line).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
