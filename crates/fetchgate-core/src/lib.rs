pub mod config;
pub mod logging;

pub mod batch;
pub mod fetcher;
pub mod gate;
pub mod input;
pub mod outcome;
pub mod retry;
pub mod storage;
pub mod transport;
pub mod url_model;

pub use batch::{BatchReport, BatchRunner, UrlJob};
pub use fetcher::Fetcher;
pub use gate::FetchGate;
pub use outcome::{FailureKind, FetchOutcome, JobState};
