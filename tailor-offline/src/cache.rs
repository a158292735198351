//! Cache-first asset serving.
//!
//! `install` pre-populates a named bucket with the application shell;
//! `fetch` answers from that bucket when it can and otherwise passes the
//! request to the network without caching the result.

use futures::future::try_join_all;

use crate::bucket::CacheStorage;
use crate::error::{AssetError, Result};
use crate::network::{AssetRequest, AssetResponse, Network};

/// The application shell assets cached on install.
pub const SHELL_ASSETS: [&str; 7] = [
    "/",
    "/index.html",
    "/styles.css",
    "/script.js",
    "/manifest.json",
    "/icon-192x192.png",
    "/icon-512x512.png",
];

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from the cache bucket.
    Cache,
    /// Cache miss, passed through to the network.
    Network,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Cache => write!(f, "cache"),
            Source::Network => write!(f, "network"),
        }
    }
}

/// Cache-first asset cache bound to one bucket and one network.
pub struct OfflineCache<N: Network> {
    storage: CacheStorage,
    bucket_name: String,
    network: N,
}

impl<N: Network> OfflineCache<N> {
    /// Creates a cache over `storage`, using the bucket called `bucket_name`.
    pub fn new(storage: CacheStorage, bucket_name: &str, network: N) -> Self {
        Self {
            storage,
            bucket_name: bucket_name.to_string(),
            network,
        }
    }

    /// Name of the active bucket.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Returns the bucket storage.
    #[must_use]
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Fetches every asset and stores them in the bucket.
    ///
    /// All assets are fetched before anything is written, so a single
    /// unreachable asset or non-success status fails the install and leaves
    /// the bucket untouched.
    pub async fn install(&self, assets: &[&str]) -> Result<usize> {
        log::info!(
            "Installing {} asset(s) into cache bucket {}",
            assets.len(),
            self.bucket_name
        );
        let requests: Vec<AssetRequest> = assets.iter().map(|a| AssetRequest::new(a)).collect();

        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = self.network.fetch(request).await?;
            if !response.is_success() {
                return Err(AssetError::Status {
                    path: request.path().to_string(),
                    status: response.status,
                });
            }
            Ok::<_, AssetError>(response)
        }))
        .await?;

        let bucket = self.storage.open(&self.bucket_name).await?;
        for (request, response) in requests.iter().zip(&responses) {
            bucket.put(request, response).await?;
        }

        log::info!("Cached {} asset(s)", requests.len());
        Ok(requests.len())
    }

    /// Installs the default application shell.
    pub async fn install_shell(&self) -> Result<usize> {
        self.install(&SHELL_ASSETS).await
    }

    /// Serves a request cache-first, falling back to the network on a miss.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<(AssetResponse, Source)> {
        if self.storage.has(&self.bucket_name).await {
            let bucket = self.storage.open(&self.bucket_name).await?;
            if let Some(response) = bucket.match_request(request).await? {
                log::debug!("Cache hit for {}", request.path());
                return Ok((response, Source::Cache));
            }
        }

        log::debug!("Cache miss for {}, using network", request.path());
        let response = self.network.fetch(request).await?;
        Ok((response, Source::Network))
    }
}
