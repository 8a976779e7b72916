use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{Duration, Instant};

use super::models::{BlogRow, BLOG_COLUMNS};
use super::BlogRepository;
use crate::blog::{Blog, BlogPatch, NewBlog};
use crate::error::BlogError;

/// Blog store backed by the `blogs` table
pub struct PgBlogRepository {
    pool: PgPool,
}

impl PgBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn slug_taken<'e, E: sqlx::PgExecutor<'e>>(
        &self,
        executor: E,
        slug: &str,
        except_id: Option<&str>,
    ) -> Result<bool, BlogError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blogs WHERE slug = $1 AND ($2::TEXT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except_id)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }
}

fn conflict_on_unique(slug: &str) -> impl FnOnce(sqlx::Error) -> BlogError + '_ {
    move |e| match BlogError::from(e) {
        BlogError::Conflict(_) => BlogError::Conflict(slug.to_string()),
        other => other,
    }
}

#[async_trait]
impl BlogRepository for PgBlogRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list_all(&self) -> Result<Vec<Blog>, BlogError> {
        let rows = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {} FROM blogs ORDER BY created_at DESC",
            BLOG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error listing blogs: {}", e);
            BlogError::from(e)
        })?;

        rows.into_iter().map(Blog::try_from).collect()
    }

    async fn get(&self, id_or_slug: &str) -> Result<Blog, BlogError> {
        // An id match wins over a slug match.
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {} FROM blogs WHERE id = $1 OR slug = $1 ORDER BY (id = $1) DESC LIMIT 1",
            BLOG_COLUMNS
        ))
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(BlogError::NotFound).and_then(Blog::try_from)
    }

    async fn create(&self, input: NewBlog) -> Result<Blog, BlogError> {
        let blog = Blog::from_new(input)?;

        if self.slug_taken(&self.pool, &blog.slug, None).await? {
            return Err(BlogError::Conflict(blog.slug));
        }

        let row = sqlx::query_as::<_, BlogRow>(&format!(
            r#"
            INSERT INTO blogs ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {cols}
            "#,
            cols = BLOG_COLUMNS
        ))
        .bind(&blog.id)
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.subtitle)
        .bind(&blog.content)
        .bind(&blog.author)
        .bind(&blog.category)
        .bind(&blog.tags)
        .bind(&blog.thumbnail)
        .bind(&blog.meta_title)
        .bind(&blog.meta_description)
        .bind(blog.status.as_str())
        .bind(blog.word_count as i32)
        .bind(blog.reading_time as i32)
        .bind(blog.created_at)
        .bind(blog.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique(&blog.slug))?;

        tracing::info!(id = %row.id, slug = %row.slug, "blog created");
        Blog::try_from(row)
    }

    async fn update(&self, id: &str, patch: BlogPatch) -> Result<Blog, BlogError> {
        let patch = patch.normalized()?.with_recomputed_stats();

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {} FROM blogs WHERE id = $1 FOR UPDATE",
            BLOG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BlogError::NotFound)?;
        let mut blog = Blog::try_from(existing)?;

        if let Some(slug) = &patch.slug {
            if self.slug_taken(&mut *tx, slug, Some(id)).await? {
                return Err(BlogError::Conflict(slug.clone()));
            }
        }

        blog.apply_patch(&patch);
        blog.touch();

        let row = sqlx::query_as::<_, BlogRow>(&format!(
            r#"
            UPDATE blogs
            SET slug = $2, title = $3, subtitle = $4, content = $5, author = $6, category = $7,
                tags = $8, thumbnail = $9, meta_title = $10, meta_description = $11, status = $12,
                word_count = $13, reading_time = $14, updated_at = $15
            WHERE id = $1
            RETURNING {}
            "#,
            BLOG_COLUMNS
        ))
        .bind(&blog.id)
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.subtitle)
        .bind(&blog.content)
        .bind(&blog.author)
        .bind(&blog.category)
        .bind(&blog.tags)
        .bind(&blog.thumbnail)
        .bind(&blog.meta_title)
        .bind(&blog.meta_description)
        .bind(blog.status.as_str())
        .bind(blog.word_count as i32)
        .bind(blog.reading_time as i32)
        .bind(blog.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(&blog.slug))?;

        tx.commit().await?;

        tracing::info!(id = %row.id, "blog updated");
        Blog::try_from(row)
    }

    async fn delete(&self, id: &str) -> Result<bool, BlogError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(id = %id, "blog deleted");
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<Duration, BlogError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}
