/**
 * JSON file blog store
 * Keeps the whole collection in one `{ "blogs": [...] }` document
 */
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{ensure_slug_free, BlogRepository};
use crate::blog::{Blog, BlogCollection, BlogPatch, NewBlog};
use crate::error::BlogError;

pub struct FileBlogRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileBlogRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty collection; an unreadable or corrupt one
    /// is a storage error so the next write cannot silently wipe it.
    async fn load(&self) -> Result<BlogCollection, BlogError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "corrupt blogs file");
                BlogError::from(e)
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BlogCollection::default()),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read blogs file");
                Err(e.into())
            }
        }
    }

    async fn save(&self, doc: &BlogCollection) -> Result<(), BlogError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write blogs file");
            BlogError::from(e)
        })
    }
}

#[async_trait]
impl BlogRepository for FileBlogRepository {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn list_all(&self) -> Result<Vec<Blog>, BlogError> {
        Ok(self.load().await?.blogs)
    }

    async fn get(&self, id_or_slug: &str) -> Result<Blog, BlogError> {
        let doc = self.load().await?;
        doc.blogs
            .iter()
            .find(|b| b.id == id_or_slug)
            .or_else(|| doc.blogs.iter().find(|b| b.slug == id_or_slug))
            .cloned()
            .ok_or(BlogError::NotFound)
    }

    async fn create(&self, input: NewBlog) -> Result<Blog, BlogError> {
        let blog = Blog::from_new(input)?;

        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        ensure_slug_free(&doc.blogs, &blog.slug, None)?;
        doc.blogs.insert(0, blog.clone());
        self.save(&doc).await?;

        tracing::info!(id = %blog.id, slug = %blog.slug, "blog created");
        Ok(blog)
    }

    async fn update(&self, id: &str, patch: BlogPatch) -> Result<Blog, BlogError> {
        let patch = patch.normalized()?.with_recomputed_stats();

        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let index = doc
            .blogs
            .iter()
            .position(|b| b.id == id)
            .ok_or(BlogError::NotFound)?;
        if let Some(slug) = &patch.slug {
            ensure_slug_free(&doc.blogs, slug, Some(id))?;
        }

        let blog = &mut doc.blogs[index];
        blog.apply_patch(&patch);
        blog.touch();
        let updated = blog.clone();
        self.save(&doc).await?;

        tracing::info!(id = %updated.id, "blog updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool, BlogError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let before = doc.blogs.len();
        doc.blogs.retain(|b| b.id != id);
        if doc.blogs.len() == before {
            return Ok(false);
        }
        self.save(&doc).await?;

        tracing::info!(id = %id, "blog deleted");
        Ok(true)
    }

    async fn health_check(&self) -> Result<Duration, BlogError> {
        let start = Instant::now();
        self.load().await?;
        Ok(start.elapsed())
    }
}
