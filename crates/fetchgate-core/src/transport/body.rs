//! Streamed response body.

use tokio::sync::mpsc;

use crate::retry::FetchError;

/// Chunks buffered between the transfer and the writer. Keeps memory per
/// job bounded; a slow disk stalls the transfer instead of growing a buffer.
pub const BODY_CHANNEL_CAPACITY: usize = 16;

/// One piece of a response body, or the error that ended the stream.
pub type BodyChunk = Result<Vec<u8>, FetchError>;

/// Receiving end of a response body. The stream ends cleanly when the sender
/// side is dropped; a failed transfer sends one `Err` first.
#[derive(Debug)]
pub struct ResponseBody {
    rx: mpsc::Receiver<BodyChunk>,
}

impl ResponseBody {
    /// Bounded channel: the sender feeds chunks, the body yields them in order.
    pub fn channel(capacity: usize) -> (mpsc::Sender<BodyChunk>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    /// Body with all bytes already in hand.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let (tx, body) = Self::channel(1);
        if !data.is_empty() {
            // Fresh channel with one free slot: cannot fail.
            let _ = tx.try_send(Ok(data));
        }
        body
    }

    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Next chunk; `None` once the body is complete.
    pub async fn next_chunk(&mut self) -> Option<BodyChunk> {
        self.rx.recv().await
    }

    /// Reads the remaining body into memory. Only for small bodies.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>, FetchError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}
