//! Network abstraction for testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AssetError, Result};

/// A request for one shell asset, identified by its exact path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    path: String,
}

impl AssetRequest {
    /// Creates a request; a missing leading slash is added.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self { path }
    }

    /// The request path, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A response as served to the caller, from the cache or the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if the origin sent one.
    pub content_type: Option<String>,
    /// Response body.
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl AssetResponse {
    /// Builds a `200 OK` response.
    #[must_use]
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the network the asset cache falls back to.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetches an asset; transport failures are errors, HTTP error statuses are not.
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

/// Network implementation fetching assets over HTTP from a fixed origin.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: String,
}

impl HttpNetwork {
    /// Creates a client for the given origin, e.g. `http://localhost:8080`.
    pub fn new(origin: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for a request path.
    #[must_use]
    pub fn url_for(&self, request: &AssetRequest) -> String {
        format!("{}{}", self.origin, request.path())
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        let url = self.url_for(request);
        log::debug!("Network fetch {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssetError::Fetch {
                path: request.path().to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(AssetResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_gets_leading_slash() {
        assert_eq!(AssetRequest::new("styles.css").path(), "/styles.css");
        assert_eq!(AssetRequest::new("/").path(), "/");
    }

    #[test]
    fn url_for_joins_origin_and_path() {
        let network = HttpNetwork::new("http://localhost:8080/").unwrap();
        assert_eq!(
            network.url_for(&AssetRequest::new("/index.html")),
            "http://localhost:8080/index.html"
        );
    }

    #[test]
    fn success_range() {
        assert!(AssetResponse::ok(None, "x").is_success());
        let missing = AssetResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
        };
        assert!(!missing.is_success());
    }
}
