/*!
 * Sync Client
 * Offline-first access to the blog API backed by a persistent local cache
 */
pub mod cache;
pub mod remote;
pub mod storage;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use cache::LocalCache;
pub use remote::{BlogApi, DynBlogApi, HttpBlogApi, RemoteError};
pub use storage::{DynStorage, FileStorage, MemoryStorage, Storage};
pub use sync::{merge, DeleteOutcome, RefreshOutcome, SaveOutcome, SyncError, SyncReconciler};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3001";
pub const DEFAULT_NAMESPACE: &str = "blogs";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `BLOG_API_BASE`, the server origin without the `/api/blogs` suffix.
    pub api_base: String,
    /// `BLOG_CACHE_DIR`; one JSON file per cache key.
    pub cache_dir: PathBuf,
    /// `BLOG_CACHE_NAMESPACE`, prefix of every cache key.
    pub namespace: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("BLOG_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            cache_dir: std::env::var("BLOG_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".blog-cache")),
            namespace: std::env::var("BLOG_CACHE_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            timeout: std::env::var("BLOG_API_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10)),
        }
    }

    /// Reconciler over a file-backed cache and the HTTP API.
    pub fn connect(&self) -> Result<SyncReconciler, RemoteError> {
        let api = HttpBlogApi::new(self.api_base.clone(), self.timeout)?;
        let cache = LocalCache::new(FileStorage::new(&self.cache_dir).into_arc(), &self.namespace);
        tracing::debug!(
            api = %self.api_base,
            cache = %self.cache_dir.display(),
            namespace = %self.namespace,
            "sync client configured"
        );
        Ok(SyncReconciler::new(cache, Arc::new(api)))
    }
}
