/**
 * Sync reconciler
 * Reconciles the local cache with the remote collection and routes writes
 * through the server, falling back to the cache when it is out of reach
 */
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::cache::LocalCache;
use super::remote::{DynBlogApi, RemoteError};
use crate::blog::{query, Blog, BlogPatch, NewBlog};
use crate::db::ensure_slug_free;
use crate::error::BlogError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Local(#[from] BlogError),
    /// The server refused the write; nothing was stored locally.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Where a write ended up.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Saved(Blog),
    /// The server was unreachable; only the local cache holds the change.
    SavedLocally(Blog),
}

impl SaveOutcome {
    pub fn blog(&self) -> &Blog {
        match self {
            SaveOutcome::Saved(blog) | SaveOutcome::SavedLocally(blog) => blog,
        }
    }

    pub fn into_blog(self) -> Blog {
        match self {
            SaveOutcome::Saved(blog) | SaveOutcome::SavedLocally(blog) => blog,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SaveOutcome::SavedLocally(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            SaveOutcome::Saved(_) => "Blog saved",
            SaveOutcome::SavedLocally(_) => "Blog saved locally",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    DeletedLocally,
}

impl DeleteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "Blog deleted successfully",
            DeleteOutcome::DeletedLocally => "Blog deleted locally",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Remote and local were merged and persisted.
    Synced(Vec<Blog>),
    /// The fetch failed; the cache is returned as-is.
    Offline(Vec<Blog>),
    /// The fetch was superseded by `invalidate` and its result dropped.
    Stale,
}

impl RefreshOutcome {
    pub fn blogs(&self) -> &[Blog] {
        match self {
            RefreshOutcome::Synced(blogs) | RefreshOutcome::Offline(blogs) => blogs,
            RefreshOutcome::Stale => &[],
        }
    }
}

/// Remote entries win by id; local-only entries follow in their own order.
///
/// A local-only entry whose slug is already taken is renamed to the first
/// free `<slug>-<n>`, so slugs stay unique across the merged list.
pub fn merge(remote: Vec<Blog>, local: Vec<Blog>) -> Vec<Blog> {
    let remote_ids: HashSet<String> = remote.iter().map(|b| b.id.clone()).collect();
    let mut taken: HashSet<String> = remote.iter().map(|b| b.slug.clone()).collect();
    let mut merged = remote;
    for mut blog in local.into_iter().filter(|b| !remote_ids.contains(&b.id)) {
        if taken.contains(&blog.slug) {
            let renamed = (2..)
                .map(|n| format!("{}-{}", blog.slug, n))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            tracing::warn!(id = %blog.id, from = %blog.slug, to = %renamed, "renaming local blog with a clashing slug");
            blog.slug = renamed;
            blog.touch();
        }
        taken.insert(blog.slug.clone());
        merged.push(blog);
    }
    merged
}

fn cache_write_failed() -> SyncError {
    BlogError::Storage("local cache write failed".to_string()).into()
}

pub struct SyncReconciler {
    cache: LocalCache,
    api: DynBlogApi,
    generation: AtomicU64,
}

impl SyncReconciler {
    pub fn new(cache: LocalCache, api: DynBlogApi) -> Self {
        Self {
            cache,
            api,
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Supersede every fetch currently in flight.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn begin(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// One-shot load. Only the first call per cache namespace goes to the
    /// server; afterwards the cache is authoritative until `refresh`.
    pub async fn initialize(&self) -> Vec<Blog> {
        if self.cache.is_initialized() {
            return self.cache.get_all();
        }

        let token = self.begin();
        let fetched = self.api.fetch_all().await;
        if !self.is_current(token) {
            tracing::debug!("dropping superseded initial fetch");
            return self.cache.get_all();
        }

        match fetched {
            Ok(blogs) => {
                tracing::info!(count = blogs.len(), "initialized blog cache from server");
                self.cache.replace_all(&blogs);
                self.cache.mark_initialized();
                blogs
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial fetch failed, using local cache");
                self.cache.mark_initialized();
                self.cache.get_all()
            }
        }
    }

    /// Fetch, merge with the cache and persist the merged list.
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.begin();
        let fetched = self.api.fetch_all().await;
        if !self.is_current(token) {
            tracing::debug!("dropping superseded refresh");
            return RefreshOutcome::Stale;
        }

        match fetched {
            Ok(remote) => {
                let merged = merge(remote, self.cache.get_all());
                self.cache.replace_all(&merged);
                RefreshOutcome::Synced(merged)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed, serving local cache");
                RefreshOutcome::Offline(self.cache.get_all())
            }
        }
    }

    /// Published blogs, newest first, from a fresh refresh when possible.
    pub async fn published(&self, category: Option<&str>) -> Vec<Blog> {
        let blogs = match self.refresh().await {
            RefreshOutcome::Synced(blogs) | RefreshOutcome::Offline(blogs) => blogs,
            RefreshOutcome::Stale => self.cache.get_all(),
        };
        query::published(&blogs, category)
    }

    pub async fn get(&self, id_or_slug: &str) -> Result<Blog, SyncError> {
        match self.api.fetch(id_or_slug).await {
            Ok(blog) => Ok(self.cache.upsert(blog)),
            Err(e) if e.allows_local_fallback() || e.is_not_found() => {
                tracing::debug!(key = %id_or_slug, error = %e, "looking up blog in local cache");
                self.cache
                    .find_by_id_or_slug(id_or_slug)
                    .ok_or_else(|| BlogError::NotFound.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Slugs are checked against the cache before the server is asked, so
    /// a blog that so far only exists locally still owns its slug.
    pub async fn create(&self, input: NewBlog) -> Result<SaveOutcome, SyncError> {
        let draft = Blog::from_new(input.clone())?;
        ensure_slug_free(&self.cache.get_all(), &draft.slug, None)?;

        match self.api.create(&input).await {
            Ok(blog) => Ok(SaveOutcome::Saved(self.cache.upsert(blog))),
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, "create failed remotely, saving locally");
                self.cache
                    .add(draft)
                    .map(SaveOutcome::SavedLocally)
                    .ok_or_else(cache_write_failed)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A 404 from the server is treated like an outage: the blog may only
    /// exist in this cache.
    pub async fn update(&self, id: &str, patch: BlogPatch) -> Result<SaveOutcome, SyncError> {
        let patch = patch.normalized()?;
        if let Some(slug) = &patch.slug {
            ensure_slug_free(&self.cache.get_all(), slug, Some(id))?;
        }

        match self.api.update(id, &patch).await {
            Ok(blog) => Ok(SaveOutcome::Saved(self.cache.upsert(blog))),
            Err(e) if e.allows_local_fallback() || e.is_not_found() => {
                tracing::warn!(id = %id, error = %e, "update failed remotely, saving locally");
                if self.cache.get_all().iter().all(|b| b.id != id) {
                    return Err(BlogError::NotFound.into());
                }
                self.cache
                    .update(id, &patch.with_recomputed_stats())
                    .map(SaveOutcome::SavedLocally)
                    .ok_or_else(cache_write_failed)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn toggle_status(&self, id_or_slug: &str) -> Result<SaveOutcome, SyncError> {
        let current = self.get(id_or_slug).await?;
        self.update(&current.id, BlogPatch::status(current.status.toggled()))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, SyncError> {
        match self.api.delete(id).await {
            Ok(()) => {
                self.cache.remove(id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.allows_local_fallback() || e.is_not_found() => {
                tracing::warn!(id = %id, error = %e, "delete failed remotely, removing locally");
                if self.cache.get_all().iter().all(|b| b.id != id) {
                    return Err(BlogError::NotFound.into());
                }
                if self.cache.remove(id) {
                    Ok(DeleteOutcome::DeletedLocally)
                } else {
                    Err(cache_write_failed())
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
