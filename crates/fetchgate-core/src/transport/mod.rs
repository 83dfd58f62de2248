//! HTTP transport seam.
//!
//! `HttpTransport::get` resolves as soon as the final response status is
//! known; the body follows lazily as a `ResponseBody` chunk stream so a page
//! is never held in memory whole. `CurlTransport` is the libcurl-backed
//! implementation; tests plug in scripted transports.

mod body;
mod libcurl;

pub use self::body::{BodyChunk, ResponseBody, BODY_CHANNEL_CAPACITY};
pub use self::libcurl::{CurlOptions, CurlTransport};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::retry::FetchError;

/// Status line plus a lazily streamed body.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u32,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u32, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A GET-capable client. Implementations must honour `cancel` promptly,
/// both while waiting for headers and while streaming the body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse, FetchError>;
}
