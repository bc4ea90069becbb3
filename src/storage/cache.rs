//! Content-addressed page cache on the local filesystem.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── 0a4d55a8d778e5022fab701977c5d840bbc486d0   # body of one URL
//! ├── 9c1185a5c5e9fc54612808977ee8f548b2258d31
//! └── ...
//! ```
//!
//! Each file is named by the hex SHA-1 of its source URL and holds the raw
//! response body. Entries are written through a temp file in the same
//! directory and renamed into place, so a file under a key name is always
//! complete. Nothing is ever evicted or revalidated.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::pin;

use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::{cache_key, http};

/// Prefix of in-flight temp files; never a valid cache key.
const TMP_PREFIX: &str = ".geoscanr-";

/// A page body and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub bytes: Vec<u8>,
    pub cache_hit: bool,
}

/// Local filesystem page cache.
#[derive(Debug, Clone)]
pub struct PageCache {
    root_dir: PathBuf,
}

impl PageCache {
    /// Create a new PageCache rooted at the given directory.
    ///
    /// The directory is created lazily on the first miss.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Final cache path for a URL.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root_dir.join(cache_key(url))
    }

    /// Whether an entry for the URL exists on disk.
    pub async fn contains(&self, url: &str) -> bool {
        tokio::fs::metadata(self.path_for(url)).await.is_ok()
    }

    /// Read an entry, returning None if it doesn't exist.
    pub async fn read(&self, url: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(url)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Return the body for a URL, downloading it only on a cache miss.
    ///
    /// A response status of 400 or above fails without writing anything.
    pub async fn fetch(
        &self,
        client: &Client,
        config: &CrawlerConfig,
        url: &str,
    ) -> Result<CachedPage> {
        let path = self.path_for(url);

        match tokio::fs::metadata(&path).await {
            Ok(_) => {
                log::info!("cache hit {}", url);
                let bytes = tokio::fs::read(&path).await?;
                return Ok(CachedPage {
                    bytes,
                    cache_hit: true,
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Io(e)),
        }

        tokio::fs::create_dir_all(&self.root_dir).await?;

        let response = http::get_with_retry(client, url, config).await?;
        let response = http::ensure_success(response, url)?;
        self.store(url, response.bytes_stream()).await?;

        let bytes = tokio::fs::read(&path).await?;
        log::debug!("cached {} as {}", url, path.display());
        Ok(CachedPage {
            bytes,
            cache_hit: false,
        })
    }

    /// Write a body atomically (write to temp, then rename).
    ///
    /// If the stream yields an error the temp file is removed and any
    /// existing entry for the URL is left untouched.
    pub async fn store<S, T, E>(&self, url: &str, chunks: S) -> Result<PathBuf>
    where
        S: Stream<Item = std::result::Result<T, E>>,
        T: AsRef<[u8]>,
        AppError: From<E>,
    {
        let path = self.path_for(url);
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .tempfile_in(&self.root_dir)?;
        let mut file = tokio::fs::File::from_std(tmp.reopen()?);

        let mut chunks = pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            file.write_all(chunk?.as_ref()).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tmp.persist(&path).map_err(|e| AppError::Io(e.error))?;
        Ok(path)
    }
}
