//! Database Models - row shapes for the `blogs` table (used by sqlx).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::blog::Blog;
use crate::error::BlogError;

pub const BLOG_COLUMNS: &str = "id, slug, title, subtitle, content, author, category, tags, \
     thumbnail, meta_title, meta_description, status, word_count, reading_time, created_at, updated_at";

/// Blog row; snake_case columns map 1:1 onto the camelCase API fields
#[derive(Debug, Clone, FromRow)]
pub struct BlogRow {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub status: String,
    pub word_count: i32,
    pub reading_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BlogRow> for Blog {
    type Error = BlogError;

    fn try_from(row: BlogRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| BlogError::Storage(format!("invalid status '{}' in row {}", row.status, row.id)))?;
        Ok(Blog {
            id: row.id,
            slug: row.slug,
            title: row.title,
            subtitle: row.subtitle,
            content: row.content,
            author: row.author,
            category: row.category,
            tags: row.tags,
            thumbnail: row.thumbnail,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            status,
            word_count: u32::try_from(row.word_count).unwrap_or(0),
            reading_time: u32::try_from(row.reading_time).unwrap_or(1),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
