//! Error types for the offline asset cache.

use thiserror::Error;

/// Errors that can occur while installing or serving cached assets.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The network request itself failed.
    #[error("fetch failed for {path}: {message}")]
    Fetch {
        /// Request path that failed.
        path: String,
        /// Underlying error description.
        message: String,
    },

    /// An asset answered with a non-success status while being installed.
    #[error("unexpected status {status} for {path}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error reading or writing a cache bucket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache entry metadata could not be encoded or decoded.
    #[error("cache metadata error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for asset cache operations.
pub type Result<T> = std::result::Result<T, AssetError>;
