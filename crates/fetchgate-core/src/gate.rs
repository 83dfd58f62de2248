//! Concurrency gate bounding in-flight fetches within one batch.
//!
//! A counting semaphore with a fixed number of slots. Each job holds a
//! `GatePermit` while it fetches; the slot goes back when the permit is
//! dropped, so every exit path (success, error, panic, task abort)
//! releases exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::retry::FetchError;

/// Default number of simultaneous fetches.
pub const DEFAULT_CAPACITY: usize = 5;

/// Fixed-capacity admission gate. Owned by a batch runner and shared with its
/// jobs by `Arc`; independent runners get independent limits.
#[derive(Debug)]
pub struct FetchGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    acquisitions: AtomicU64,
}

/// One admitted slot. Releases on drop.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl FetchGate {
    /// Create a gate with `capacity` slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            acquisitions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held by permits.
    pub fn in_use(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Total permits handed out since construction.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Wait for a free slot. Returns `FetchError::Cancelled` as soon as
    /// `cancel` fires, without taking a slot.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<GatePermit, FetchError> {
        let semaphore = Arc::clone(&self.semaphore);
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            permit = semaphore.acquire_owned() => permit,
        };
        // The semaphore is never closed; a closed gate can only mean shutdown.
        let permit = permit.map_err(|_| FetchError::Cancelled)?;
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        Ok(GatePermit { _permit: permit })
    }
}

impl Default for FetchGate {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
