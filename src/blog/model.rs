//! Blog entity and the request shapes that create or modify it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::stats::{compute_stats, generate_slug, is_valid_slug, ReadingStats};
use crate::error::BlogError;

/// Categories offered by the editor.
pub const BLOG_CATEGORIES: &[&str] = &[
    "Agriculture",
    "Technology",
    "Marketing",
    "Rural Development",
    "Farmer Stories",
    "Industry News",
    "Product Updates",
    "Case Studies",
    "Best Practices",
    "Other",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

impl BlogStatus {
    pub fn toggled(self) -> Self {
        match self {
            BlogStatus::Draft => BlogStatus::Published,
            BlogStatus::Published => BlogStatus::Draft,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlogStatus {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BlogStatus::Draft),
            "published" => Ok(BlogStatus::Published),
            other => Err(BlogError::Validation(format!("unknown status '{}'", other))),
        }
    }
}

/// Blog post as stored on the server and mirrored by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default = "default_reading_time")]
    pub reading_time: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_reading_time() -> u32 {
    1
}

/// Request body for creating a blog: everything except the id, timestamps
/// and derived statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogStatus>,
}

/// Partial update. Absent fields are left untouched; `thumbnail: null`
/// clears the thumbnail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogStatus>,
    /// Derived statistics to store alongside `content`. Never read from or
    /// written to the wire: servers always recompute.
    #[serde(skip)]
    pub stats: Option<ReadingStats>,
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// On-disk and cached document shape: `{ "blogs": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogCollection {
    #[serde(default)]
    pub blogs: Vec<Blog>,
}

pub fn generate_blog_id() -> String {
    format!("blog-{}", Uuid::new_v4().simple())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Blog {
    /// Build a fresh record from a create request.
    ///
    /// Assigns the id, resolves the slug, computes statistics and stamps
    /// both timestamps with the same instant. Slug uniqueness is the
    /// caller's concern since it depends on the surrounding collection.
    pub fn from_new(input: NewBlog) -> Result<Self, BlogError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(BlogError::Validation("Title is required".to_string()));
        }

        let slug = match non_blank(input.slug) {
            Some(explicit) => generate_slug(&explicit),
            None => generate_slug(&title),
        };
        if !is_valid_slug(&slug) {
            return Err(BlogError::Validation(
                "Slug must contain at least one letter or number".to_string(),
            ));
        }

        let stats = compute_stats(&input.content);
        let now = Utc::now();
        let meta_title = non_blank(input.meta_title).unwrap_or_else(|| title.clone());
        let meta_description =
            non_blank(input.meta_description).unwrap_or_else(|| input.subtitle.clone());

        Ok(Self {
            id: generate_blog_id(),
            slug,
            title,
            subtitle: input.subtitle,
            content: input.content,
            author: input.author,
            category: input.category,
            tags: input.tags,
            thumbnail: input.thumbnail,
            meta_title,
            meta_description,
            status: input.status.unwrap_or_default(),
            word_count: stats.word_count,
            reading_time: stats.reading_time,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn stats(&self) -> ReadingStats {
        ReadingStats {
            word_count: self.word_count,
            reading_time: self.reading_time,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == BlogStatus::Published
    }

    /// Merge a patch into this record. Does not touch `updated_at`.
    pub fn apply_patch(&mut self, patch: &BlogPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(subtitle) = &patch.subtitle {
            self.subtitle = subtitle.clone();
        }
        if let Some(slug) = &patch.slug {
            self.slug = slug.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(thumbnail) = &patch.thumbnail {
            self.thumbnail = thumbnail.clone();
        }
        if let Some(meta_title) = &patch.meta_title {
            self.meta_title = meta_title.clone();
        }
        if let Some(meta_description) = &patch.meta_description {
            self.meta_description = meta_description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(stats) = patch.stats {
            self.word_count = stats.word_count;
            self.reading_time = stats.reading_time;
        }
    }

    /// Stamp `updated_at`, keeping it strictly increasing even when the
    /// clock has not advanced since the previous write.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

impl BlogPatch {
    pub fn status(status: BlogStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Attach statistics derived from `content`, if the patch carries any.
    pub fn with_recomputed_stats(mut self) -> Self {
        self.stats = self.content.as_deref().map(compute_stats);
        self
    }

    /// Normalize an explicit slug the same way titles are slugified.
    pub fn normalized(mut self) -> Result<Self, BlogError> {
        if let Some(slug) = self.slug.take() {
            let normalized = generate_slug(&slug);
            if !is_valid_slug(&normalized) {
                return Err(BlogError::Validation(
                    "Slug must contain at least one letter or number".to_string(),
                ));
            }
            self.slug = Some(normalized);
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(BlogError::Validation("Title is required".to_string()));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_blog(title: &str, content: &str) -> NewBlog {
        NewBlog {
            title: title.to_string(),
            content: content.to_string(),
            ..NewBlog::default()
        }
    }

    #[test]
    fn test_from_new_derives_slug_stats_and_defaults() {
        let blog = Blog::from_new(new_blog("Farming Tips", "<p>word word word</p>")).unwrap();
        assert_eq!(blog.slug, "farming-tips");
        assert_eq!(blog.word_count, 3);
        assert_eq!(blog.reading_time, 1);
        assert_eq!(blog.status, BlogStatus::Draft);
        assert_eq!(blog.meta_title, "Farming Tips");
        assert_eq!(blog.created_at, blog.updated_at);
        assert!(blog.id.starts_with("blog-"));
    }

    #[test]
    fn test_from_new_prefers_explicit_slug() {
        let mut input = new_blog("A", "");
        input.slug = Some("Custom Slug".to_string());
        let blog = Blog::from_new(input).unwrap();
        assert_eq!(blog.slug, "custom-slug");
    }

    #[test]
    fn test_from_new_rejects_blank_title_and_empty_slug() {
        assert!(matches!(
            Blog::from_new(new_blog("   ", "x")),
            Err(BlogError::Validation(_))
        ));
        assert!(matches!(
            Blog::from_new(new_blog("???", "x")),
            Err(BlogError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_patch_merges_only_present_fields() {
        let mut blog = Blog::from_new(new_blog("Title", "<p>a b</p>")).unwrap();
        blog.thumbnail = Some("thumb.png".to_string());
        let patch = BlogPatch {
            subtitle: Some("Sub".to_string()),
            thumbnail: Some(None),
            ..BlogPatch::default()
        };
        blog.apply_patch(&patch);
        assert_eq!(blog.title, "Title");
        assert_eq!(blog.subtitle, "Sub");
        assert_eq!(blog.thumbnail, None);
        assert_eq!(blog.word_count, 2);
    }

    #[test]
    fn test_patch_thumbnail_null_differs_from_absent() {
        let cleared: BlogPatch = serde_json::from_str(r#"{"thumbnail":null}"#).unwrap();
        assert_eq!(cleared.thumbnail, Some(None));
        let absent: BlogPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.thumbnail, None);
    }

    #[test]
    fn test_patch_stats_never_cross_the_wire() {
        let patch: BlogPatch =
            serde_json::from_str(r#"{"content":"<p>x</p>","stats":{"wordCount":99}}"#).unwrap();
        assert!(patch.stats.is_none());
        let patch = patch.with_recomputed_stats();
        assert_eq!(patch.stats.map(|s| s.word_count), Some(1));
        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("stats").is_none());
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut blog = Blog::from_new(new_blog("T", "")).unwrap();
        blog.updated_at = Utc::now() + Duration::hours(1);
        let before = blog.updated_at;
        blog.touch();
        assert!(blog.updated_at > before);
    }

    #[test]
    fn test_status_toggle_and_serde() {
        assert_eq!(BlogStatus::Draft.toggled(), BlogStatus::Published);
        assert_eq!(BlogStatus::Published.toggled(), BlogStatus::Draft);
        assert_eq!(serde_json::to_string(&BlogStatus::Published).unwrap(), "\"published\"");
        assert_eq!("draft".parse::<BlogStatus>().unwrap(), BlogStatus::Draft);
        assert!("archived".parse::<BlogStatus>().is_err());
    }

    #[test]
    fn test_blog_serializes_camel_case() {
        let blog = Blog::from_new(new_blog("T", "<p>x</p>")).unwrap();
        let json = serde_json::to_value(&blog).unwrap();
        assert!(json.get("wordCount").is_some());
        assert!(json.get("readingTime").is_some());
        assert!(json.get("metaTitle").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
