//! On-disk cache buckets.
//!
//! Each bucket is a directory under the cache root. Every entry is stored as
//! a `<key>.json` metadata file next to a `<key>.body` file, where `<key>` is
//! the base64url encoding of the exact request path.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::network::{AssetRequest, AssetResponse};

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    path: String,
    #[serde(flatten)]
    response: AssetResponse,
}

/// Root directory holding named cache buckets.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Creates a handle; the directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens (creating if needed) the bucket with the given name.
    pub async fn open(&self, name: &str) -> Result<CacheBucket> {
        let dir = self.root.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(CacheBucket {
            name: name.to_string(),
            dir,
        })
    }

    /// Returns true if a bucket with this name exists.
    pub async fn has(&self, name: &str) -> bool {
        tokio::fs::metadata(self.root.join(name))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Deletes a bucket; returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if !self.has(name).await {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(self.root.join(name)).await?;
        log::info!("Deleted cache bucket {name}");
        Ok(true)
    }

    /// Lists bucket names in sorted order.
    pub async fn bucket_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// A single named bucket of cached responses.
#[derive(Debug, Clone)]
pub struct CacheBucket {
    name: String,
    dir: PathBuf,
}

impl CacheBucket {
    /// Bucket name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(request: &AssetRequest) -> String {
        URL_SAFE_NO_PAD.encode(request.path())
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.body"))
    }

    /// Looks up a cached response by exact request path.
    pub async fn match_request(&self, request: &AssetRequest) -> Result<Option<AssetResponse>> {
        let key = Self::key(request);
        let meta = match tokio::fs::read(self.meta_path(&key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = serde_json::from_slice(&meta)?;
        let body = tokio::fs::read(self.body_path(&key)).await?;

        Ok(Some(AssetResponse { body, ..meta.response }))
    }

    /// Stores a response, replacing any previous entry for the same path.
    pub async fn put(&self, request: &AssetRequest, response: &AssetResponse) -> Result<()> {
        let key = Self::key(request);
        // Body first: an entry is only visible once its metadata exists.
        tokio::fs::write(self.body_path(&key), &response.body).await?;
        let meta = EntryMeta {
            path: request.path().to_string(),
            response: response.clone(),
        };
        tokio::fs::write(self.meta_path(&key), serde_json::to_vec_pretty(&meta)?).await?;
        Ok(())
    }

    /// Lists the cached request paths in sorted order.
    pub async fn paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let meta: EntryMeta = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
            paths.push(meta.path);
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_then_match() {
        let dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(dir.path());
        let bucket = storage.open("v1").await.unwrap();

        let request = AssetRequest::new("/styles.css");
        let response = AssetResponse::ok(Some("text/css"), "body { margin: 0 }");
        bucket.put(&request, &response).await.unwrap();

        let cached = bucket.match_request(&request).await.unwrap();
        assert_eq!(cached, Some(response));
        assert_eq!(bucket.paths().await.unwrap(), vec!["/styles.css"]);
    }

    #[tokio::test]
    async fn match_is_exact() {
        let dir = TempDir::new().unwrap();
        let bucket = CacheStorage::new(dir.path()).open("v1").await.unwrap();
        bucket
            .put(&AssetRequest::new("/"), &AssetResponse::ok(None, "root"))
            .await
            .unwrap();

        assert!(bucket
            .match_request(&AssetRequest::new("/index.html"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn bucket_names_and_delete() {
        let dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(dir.path().join("cache"));
        assert!(storage.bucket_names().await.unwrap().is_empty());

        storage.open("v2").await.unwrap();
        storage.open("v1").await.unwrap();
        assert_eq!(storage.bucket_names().await.unwrap(), vec!["v1", "v2"]);

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(!storage.has("v1").await);
        assert!(storage.has("v2").await);
    }
}
