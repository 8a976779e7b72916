/**
 * Local blog cache
 * Client-side mirror of the whole collection under one storage key
 */
use parking_lot::Mutex;

use super::storage::DynStorage;
use crate::blog::{Blog, BlogCollection, BlogPatch};

/// Mirror of the blog collection, readable while the server is down.
///
/// Every operation swallows storage failures (they are logged) and an
/// unavailable medium turns every call into a no-op, so callers never see
/// an error from the cache.
pub struct LocalCache {
    storage: Option<DynStorage>,
    data_key: String,
    initialized_key: String,
    // Serializes read-modify-write cycles from this process.
    lock: Mutex<()>,
}

impl LocalCache {
    pub fn new(storage: DynStorage, namespace: &str) -> Self {
        Self {
            storage: Some(storage),
            data_key: format!("{}:data", namespace),
            initialized_key: format!("{}:initialized", namespace),
            lock: Mutex::new(()),
        }
    }

    /// Cache with no backing medium.
    pub fn unavailable() -> Self {
        Self {
            storage: None,
            data_key: String::new(),
            initialized_key: String::new(),
            lock: Mutex::new(()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn load(&self) -> Vec<Blog> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        match storage.get(&self.data_key) {
            Ok(Some(raw)) => match serde_json::from_str::<BlogCollection>(&raw) {
                Ok(doc) => doc.blogs,
                Err(e) => {
                    tracing::warn!(key = %self.data_key, error = %e, "discarding unreadable blog cache");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.data_key, error = %e, "failed to read blog cache");
                Vec::new()
            }
        }
    }

    fn store(&self, blogs: &[Blog]) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        let doc = BlogCollection {
            blogs: blogs.to_vec(),
        };
        let result = serde_json::to_string(&doc)
            .map_err(anyhow::Error::from)
            .and_then(|raw| storage.set(&self.data_key, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %self.data_key, error = %e, "failed to write blog cache");
                false
            }
        }
    }

    pub fn get_all(&self) -> Vec<Blog> {
        let _guard = self.lock.lock();
        self.load()
    }

    pub fn replace_all(&self, blogs: &[Blog]) {
        let _guard = self.lock.lock();
        self.store(blogs);
    }

    /// Prepend so the collection stays most-recent-first. `None` when the
    /// blog could not be persisted.
    pub fn add(&self, blog: Blog) -> Option<Blog> {
        let _guard = self.lock.lock();
        let mut blogs = self.load();
        blogs.insert(0, blog.clone());
        self.store(&blogs).then_some(blog)
    }

    /// Replace the entry with the same id in place, or prepend it.
    pub fn upsert(&self, blog: Blog) -> Blog {
        let _guard = self.lock.lock();
        let mut blogs = self.load();
        match blogs.iter_mut().find(|b| b.id == blog.id) {
            Some(existing) => *existing = blog.clone(),
            None => blogs.insert(0, blog.clone()),
        }
        self.store(&blogs);
        blog
    }

    /// Merge `patch` into the blog with this id and stamp `updated_at`.
    ///
    /// Statistics are taken from `patch.stats` as given; callers that
    /// change `content` must attach recomputed stats first. `None` when the
    /// id is absent or the change could not be persisted.
    pub fn update(&self, id: &str, patch: &BlogPatch) -> Option<Blog> {
        let _guard = self.lock.lock();
        let mut blogs = self.load();
        let blog = blogs.iter_mut().find(|b| b.id == id)?;
        blog.apply_patch(patch);
        blog.touch();
        let updated = blog.clone();
        self.store(&blogs).then_some(updated)
    }

    pub fn remove(&self, id: &str) -> bool {
        let _guard = self.lock.lock();
        let mut blogs = self.load();
        let before = blogs.len();
        blogs.retain(|b| b.id != id);
        if blogs.len() == before {
            return false;
        }
        self.store(&blogs)
    }

    pub fn find_by_id_or_slug(&self, key: &str) -> Option<Blog> {
        self.get_all()
            .into_iter()
            .find(|b| b.id == key || b.slug == key)
    }

    pub fn is_initialized(&self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        matches!(storage.get(&self.initialized_key), Ok(Some(v)) if v == "true")
    }

    pub fn mark_initialized(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set(&self.initialized_key, "true") {
                tracing::warn!(key = %self.initialized_key, error = %e, "failed to persist init flag");
            }
        }
    }

    /// Forget the init flag so the next `initialize` fetches again.
    pub fn clear_initialized(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.remove(&self.initialized_key) {
                tracing::warn!(key = %self.initialized_key, error = %e, "failed to clear init flag");
            }
        }
    }
}
