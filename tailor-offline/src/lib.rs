//! Offline asset cache for the Tailor application shell.
//!
//! Runs independently of the record store: its only state is the cache
//! buckets on disk.

pub mod bucket;
pub mod cache;
pub mod error;
pub mod network;

pub use bucket::{CacheBucket, CacheStorage};
pub use cache::{OfflineCache, Source, SHELL_ASSETS};
pub use error::{AssetError, Result};
pub use network::{AssetRequest, AssetResponse, HttpNetwork, Network};
