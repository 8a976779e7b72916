pub mod file;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::blog::{Blog, BlogPatch, NewBlog};
use crate::error::BlogError;

pub use file::FileBlogRepository;
pub use postgres::PgBlogRepository;

pub const DEFAULT_BLOGS_FILE: &str = "data/blogs/blogs.json";

/// Authoritative blog storage.
///
/// Implementations enforce slug uniqueness on both create and update,
/// recompute word count and reading time whenever content is written, and
/// bump `updated_at` on every mutation. Storage failures surface as
/// [`BlogError::Storage`] and are not retried.
#[async_trait]
pub trait BlogRepository: Send + Sync + 'static {
    fn backend(&self) -> &'static str;

    /// Every blog in stored order (newest first), drafts included.
    async fn list_all(&self) -> Result<Vec<Blog>, BlogError>;

    /// Lookup by id, falling back to slug.
    async fn get(&self, id_or_slug: &str) -> Result<Blog, BlogError>;

    async fn create(&self, input: NewBlog) -> Result<Blog, BlogError>;

    async fn update(&self, id: &str, patch: BlogPatch) -> Result<Blog, BlogError>;

    /// Returns `false` when no blog has this id.
    async fn delete(&self, id: &str) -> Result<bool, BlogError>;

    /// Round-trip time of a trivial read against the backing store.
    async fn health_check(&self) -> Result<Duration, BlogError>;
}

pub type DynBlogRepository = Arc<dyn BlogRepository>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub file_path: PathBuf,
    pub db: DbConfig,
}

impl StoreConfig {
    /// `BLOG_STORE` picks the backend explicitly; otherwise Postgres is
    /// used whenever `DATABASE_URL` is set.
    pub fn from_env() -> Self {
        let backend = match std::env::var("BLOG_STORE").ok().as_deref() {
            Some("postgres") | Some("postgresql") => StoreBackend::Postgres,
            Some("file") => StoreBackend::File,
            Some(other) => {
                tracing::warn!(store = %other, "unknown BLOG_STORE, using the JSON file store");
                StoreBackend::File
            }
            None if std::env::var("DATABASE_URL").is_ok() => StoreBackend::Postgres,
            None => StoreBackend::File,
        };

        Self {
            backend,
            file_path: std::env::var("BLOGS_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_BLOGS_FILE)),
            db: DbConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/blog".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blogs (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT '',
            tags TEXT[] NOT NULL DEFAULT '{}',
            thumbnail TEXT,
            meta_title TEXT NOT NULL DEFAULT '',
            meta_description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published')),
            word_count INTEGER NOT NULL DEFAULT 0,
            reading_time INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_blogs_slug ON blogs(slug)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_blogs_status_created ON blogs(status, created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

/// Open the repository selected by `config`, running migrations for the
/// relational backend.
pub async fn open_repository(config: &StoreConfig) -> Result<DynBlogRepository, BlogError> {
    match config.backend {
        StoreBackend::File => {
            tracing::info!(path = %config.file_path.display(), "using JSON file blog store");
            Ok(Arc::new(FileBlogRepository::new(&config.file_path)))
        }
        StoreBackend::Postgres => {
            let pool = init_pool(&config.db).await?;
            run_migrations(&pool).await?;
            tracing::info!("using Postgres blog store");
            Ok(Arc::new(PgBlogRepository::new(pool)))
        }
    }
}

/// Rejects `slug` when a blog other than `except_id` already owns it.
pub(crate) fn ensure_slug_free(
    blogs: &[Blog],
    slug: &str,
    except_id: Option<&str>,
) -> Result<(), BlogError> {
    let taken = blogs
        .iter()
        .any(|b| b.slug == slug && Some(b.id.as_str()) != except_id);
    if taken {
        Err(BlogError::Conflict(slug.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_default_uses_env_or_fallback() {
        let config = DbConfig::default();
        assert!(config.max_connections >= 1);
        assert!(config.connect_timeout_secs >= 1);
        assert!(config.idle_timeout_secs >= 1);
        assert!(!config.url.is_empty());
    }

    #[test]
    fn test_store_config_has_file_path() {
        let config = StoreConfig::from_env();
        assert!(!config.file_path.as_os_str().is_empty());
    }

    #[test]
    fn test_ensure_slug_free_ignores_own_record() {
        let blog = Blog::from_new(NewBlog {
            title: "Taken".to_string(),
            ..NewBlog::default()
        })
        .unwrap();
        let blogs = vec![blog.clone()];
        assert!(ensure_slug_free(&blogs, "taken", Some(&blog.id)).is_ok());
        assert!(matches!(
            ensure_slug_free(&blogs, "taken", None),
            Err(BlogError::Conflict(_))
        ));
        assert!(ensure_slug_free(&blogs, "free", None).is_ok());
    }
}
