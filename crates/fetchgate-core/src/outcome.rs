//! Per-URL results and job states.

use std::fmt;

use crate::retry::{classify_curl_error, ErrorKind, FetchError};

/// Why a job ended in `FetchOutcome::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    /// Server kept answering with a retryable status (408 or 5xx).
    HttpStatus(u16),
    Storage,
    /// The job task itself died (panic).
    Internal,
}

impl FailureKind {
    pub fn from_error(e: &FetchError) -> Self {
        match e {
            FetchError::InvalidUrl(_) => FailureKind::InvalidUrl,
            FetchError::Transport(ce) if ce.is_url_malformed() => FailureKind::InvalidUrl,
            FetchError::Transport(ce) => match classify_curl_error(ce) {
                ErrorKind::Timeout => FailureKind::Timeout,
                _ => FailureKind::Network,
            },
            FetchError::Http(code) => FailureKind::HttpStatus(*code as u16),
            FetchError::Body(_) => FailureKind::Network,
            FetchError::Storage(_) => FailureKind::Storage,
            FetchError::Cancelled => FailureKind::Internal,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid-url"),
            FailureKind::Network => write!(f, "network"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http-{}", code),
            FailureKind::Storage => write!(f, "storage"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

/// Terminal result of one URL job. Never aborts sibling jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response streamed into `file`.
    Success {
        file: String,
        bytes_written: u64,
        attempts: u32,
    },
    /// Non-success status that is not worth retrying (e.g. 404). Nothing written.
    Skipped { status: u32, attempts: u32 },
    Failed {
        kind: FailureKind,
        message: String,
        attempts: u32,
    },
    /// The batch was cancelled before this job finished.
    Cancelled,
}

impl FetchOutcome {
    pub(crate) fn failed(error: &FetchError, attempts: u32) -> Self {
        FetchOutcome::Failed {
            kind: FailureKind::from_error(error),
            message: error.to_string(),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// HTTP attempts made (0 when the job never reached the network).
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. }
            | FetchOutcome::Skipped { attempts, .. }
            | FetchOutcome::Failed { attempts, .. } => *attempts,
            FetchOutcome::Cancelled => 0,
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Success {
                file,
                bytes_written,
                ..
            } => write!(f, "saved {} ({} bytes)", file, bytes_written),
            FetchOutcome::Skipped { status, .. } => write!(f, "skipped: HTTP {}", status),
            FetchOutcome::Failed {
                kind,
                message,
                attempts,
            } => write!(
                f,
                "failed ({}) after {} attempt(s): {}",
                kind, attempts, message
            ),
            FetchOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle of a URL job, for debug logging.
///
/// `Pending → Gated → Fetching → (Retrying → Fetching)* → Terminal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Gated,
    Fetching,
    Retrying,
    Terminal,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Gated => "gated",
            JobState::Fetching => "fetching",
            JobState::Retrying => "retrying",
            JobState::Terminal => "terminal",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
