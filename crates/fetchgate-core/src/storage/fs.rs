//! Filesystem page store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{temp_path, PageStore};
use crate::retry::FetchError;
use crate::transport::ResponseBody;

/// Writes pages under one output directory.
#[derive(Debug, Clone)]
pub struct FsPageStore {
    dir: PathBuf,
}

impl FsPageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path of a page.
    pub fn page_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

#[async_trait]
impl PageStore for FsPageStore {
    async fn prepare(&self) -> Result<(), FetchError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn persist(&self, file_name: &str, mut body: ResponseBody) -> Result<u64, FetchError> {
        let final_path = self.page_path(file_name);
        let part = PartFile::new(temp_path(&final_path));

        let mut file = tokio::fs::File::create(part.path()).await?;
        let mut written = 0u64;
        while let Some(chunk) = body.next_chunk().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(part.path(), &final_path).await?;
        part.keep();
        tracing::debug!(path = %final_path.display(), bytes = written, "page finalized");
        Ok(written)
    }
}

/// Removes the temp file on drop unless the page was finalized. Covers
/// write errors and jobs dropped mid-stream by cancellation.
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TEMP_SUFFIX;

    #[tokio::test]
    async fn persist_streams_and_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPageStore::new(dir.path().join("pages"));
        store.prepare().await.unwrap();

        let (tx, body) = ResponseBody::channel(2);
        let feeder = tokio::spawn(async move {
            for part in ["<html>", "<body>hi</body>", "</html>"] {
                tx.send(Ok(part.as_bytes().to_vec())).await.unwrap();
            }
        });
        let n = store.persist("example.com.html", body).await.unwrap();
        feeder.await.unwrap();

        let page = store.page_path("example.com.html");
        assert_eq!(n, 28);
        assert_eq!(
            std::fs::read_to_string(&page).unwrap(),
            "<html><body>hi</body></html>"
        );
        assert!(!temp_path(&page).exists());
    }

    #[tokio::test]
    async fn broken_body_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPageStore::new(dir.path());
        let (tx, body) = ResponseBody::channel(2);
        tx.send(Ok(b"partial".to_vec())).await.unwrap();
        tx.send(Err(FetchError::Body("connection reset".into())))
            .await
            .unwrap();
        drop(tx);

        let err = store.persist("a.html", body).await.unwrap_err();
        assert!(matches!(err, FetchError::Body(_)));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "no page and no {} file", TEMP_SUFFIX);
    }

    #[test]
    fn pages_live_under_the_store_dir() {
        let store = FsPageStore::new("DownloadedPages");
        assert_eq!(store.dir(), Path::new("DownloadedPages"));
        assert_eq!(
            store.page_path("example.com.html"),
            Path::new("DownloadedPages").join("example.com.html")
        );
    }

    #[tokio::test]
    async fn missing_directory_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPageStore::new(dir.path().join("never-created"));
        let err = store
            .persist("a.html", ResponseBody::from_bytes("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Storage(_)));
    }
}
