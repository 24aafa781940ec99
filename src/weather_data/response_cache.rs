//! On-disk cache of raw archive bodies, keyed by request URL. Entries never expire:
//! the archive's historic data does not change once published.

use crate::utils::ensure_dir_exists;
use crate::weather_data::error::FetchError;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub async fn open(dir: &Path) -> Result<Self, FetchError> {
        ensure_dir_exists(dir)
            .await
            .map_err(|e| FetchError::CacheDirCreation(dir.to_path_buf(), e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        self.dir.join(format!("{}.json", digest))
    }

    /// Returns the cached body for `url`. Unreadable entries count as misses.
    pub async fn load(&self, url: &str) -> Option<String> {
        let path = self.entry_path(url);
        match fs::read_to_string(&path).await {
            Ok(body) => {
                debug!("Cache hit for {} at {:?}", url, path);
                Some(body)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Stores `body` for `url`. A failed write only costs a refetch later.
    pub async fn store(&self, url: &str, body: &str) {
        let path = self.entry_path(url);
        if let Err(e) = fs::write(&path, body).await {
            warn!("Failed to write cache entry {:?}: {}", path, e);
        }
    }

    /// Drops the entry for `url`, e.g. after it turned out to be unusable.
    pub async fn evict(&self, url: &str) {
        let path = self.entry_path(url);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to delete cache entry {:?}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_then_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let cache = ResponseCache::open(&dir.path().join("nested")).await?;
        let url = "https://archive.test/v1/archive?latitude=37.2";

        assert_eq!(cache.load(url).await, None);
        cache.store(url, "[]").await;
        assert_eq!(cache.load(url).await.as_deref(), Some("[]"));
        assert_eq!(cache.load("https://archive.test/other").await, None);

        cache.evict(url).await;
        assert_eq!(cache.load(url).await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_entry_names_are_stable_digests() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let cache = ResponseCache::open(dir.path()).await?;

        cache.store("abc", "[]").await;

        let expected = dir
            .path()
            .join("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.json");
        assert_eq!(std::fs::read_to_string(expected)?, "[]");
        Ok(())
    }

    #[tokio::test]
    async fn test_open_rejects_file_path() -> Result<(), Box<dyn std::error::Error>> {
        let file = tempfile::NamedTempFile::new()?;
        let result = ResponseCache::open(file.path()).await;
        assert!(matches!(result, Err(FetchError::CacheDirCreation(..))));
        Ok(())
    }
}
