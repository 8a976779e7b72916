//! Read-side views over a blog collection: public listing, related posts,
//! management filters and JSON export.

use serde::Deserialize;

use super::model::{Blog, BlogCollection, BlogStatus};

/// Published blogs only, newest first, optionally narrowed to a category.
pub fn published(blogs: &[Blog], category: Option<&str>) -> Vec<Blog> {
    let mut items: Vec<Blog> = blogs
        .iter()
        .filter(|b| b.is_published())
        .filter(|b| category.is_none_or(|c| b.category == c))
        .cloned()
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

/// Published blog by slug; drafts are treated as missing.
pub fn find_published<'a>(blogs: &'a [Blog], slug: &str) -> Option<&'a Blog> {
    blogs.iter().find(|b| b.slug == slug && b.is_published())
}

/// Up to `limit` other published posts sharing the category or any tag.
pub fn related(blogs: &[Blog], blog: &Blog, limit: usize) -> Vec<Blog> {
    blogs
        .iter()
        .filter(|b| b.id != blog.id && b.is_published())
        .filter(|b| {
            (!blog.category.is_empty() && b.category == blog.category)
                || b.tags.iter().any(|t| blog.tags.contains(t))
        })
        .take(limit)
        .cloned()
        .collect()
}

/// Distinct non-empty categories in first-seen order.
pub fn categories(blogs: &[Blog]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for blog in blogs {
        if !blog.category.is_empty() && !seen.contains(&blog.category) {
            seen.push(blog.category.clone());
        }
    }
    seen
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Draft,
    Published,
}

impl StatusFilter {
    fn matches(self, status: BlogStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Draft => status == BlogStatus::Draft,
            StatusFilter::Published => status == BlogStatus::Published,
        }
    }
}

/// Management dashboard filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub category: Option<String>,
}

impl BlogFilter {
    pub fn matches(&self, blog: &Blog) -> bool {
        if !self.status.matches(blog.status) {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if blog.category != category {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            None => true,
            Some(query) => {
                let query = query.to_lowercase();
                blog.title.to_lowercase().contains(&query)
                    || blog.author.to_lowercase().contains(&query)
                    || blog.category.to_lowercase().contains(&query)
                    || blog.tags.iter().any(|t| t.to_lowercase().contains(&query))
            }
        }
    }

    pub fn apply(&self, blogs: &[Blog]) -> Vec<Blog> {
        blogs.iter().filter(|b| self.matches(b)).cloned().collect()
    }
}

/// Suggested file name and pretty JSON body for a single blog.
pub fn export_blog(blog: &Blog) -> serde_json::Result<(String, String)> {
    Ok((format!("{}.json", blog.slug), serde_json::to_string_pretty(blog)?))
}

/// Whole collection as `{ "blogs": [...] }`.
pub fn export_all(blogs: &[Blog]) -> serde_json::Result<(String, String)> {
    let doc = BlogCollection {
        blogs: blogs.to_vec(),
    };
    Ok(("blogs.json".to_string(), serde_json::to_string_pretty(&doc)?))
}
