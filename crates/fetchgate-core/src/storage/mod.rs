//! Page persistence.
//!
//! `PageStore` is the port the fetcher writes through; `FsPageStore` streams
//! each body into a `.part` file next to its final name, syncs, then renames
//! it into place so a page on disk is always complete.

mod fs;

pub use fs::FsPageStore;

use async_trait::async_trait;

use crate::retry::FetchError;
use crate::transport::ResponseBody;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Where fetched pages go.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Called once before the first job of a non-empty batch starts.
    async fn prepare(&self) -> Result<(), FetchError> {
        Ok(())
    }

    /// Streams `body` into the page `file_name`. Returns the bytes written.
    async fn persist(&self, file_name: &str, body: ResponseBody) -> Result<u64, FetchError>;
}

/// Path for the temp file: appends `.part` to the final path (e.g. `a.html` → `a.html.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
