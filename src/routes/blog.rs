/**
 * Blog Routes
 * CRUD API endpoints plus the published-only public views
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::blog::query::{self, BlogFilter};
use crate::blog::{Blog, BlogPatch, NewBlog};
use crate::error::BlogError;
use crate::state::AppState;

/// Related posts shown under a public blog
const RELATED_LIMIT: usize = 3;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for GET /api/blogs and GET /api/public/blogs
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogListResponse {
    pub success: bool,
    pub blogs: Vec<Blog>,
}

/// Response carrying one blog
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogResponse {
    pub success: bool,
    pub blog: Blog,
}

/// Response for GET /api/public/blogs/{slug}
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicBlogResponse {
    pub success: bool,
    pub blog: Blog,
    pub related: Vec<Blog>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<String>,
}

/// Response for DELETE /api/blogs/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Query parameters for GET /api/public/blogs
#[derive(Debug, Deserialize)]
pub struct PublicListQuery {
    pub category: Option<String>,
}

// ============================================================================
// Management handlers
// ============================================================================

/// GET /api/blogs - Every blog, drafts included, optionally filtered
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(filter): Query<BlogFilter>,
) -> Result<Json<BlogListResponse>, BlogError> {
    let blogs = state.repo().list_all().await?;
    Ok(Json(BlogListResponse {
        success: true,
        blogs: filter.apply(&blogs),
    }))
}

/// POST /api/blogs - Create a blog
pub async fn create_blog(
    State(state): State<AppState>,
    Json(payload): Json<NewBlog>,
) -> Result<impl IntoResponse, BlogError> {
    let blog = state.repo().create(payload).await.inspect_err(|e| {
        tracing::warn!(error = %e, "blog creation rejected");
    })?;
    Ok((
        StatusCode::CREATED,
        Json(BlogResponse {
            success: true,
            blog,
        }),
    ))
}

/// GET /api/blogs/{idOrSlug} - Single blog by id or slug
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<BlogResponse>, BlogError> {
    let blog = state.repo().get(&id_or_slug).await?;
    Ok(Json(BlogResponse {
        success: true,
        blog,
    }))
}

/// PUT /api/blogs/{id} - Partial update
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<BlogPatch>,
) -> Result<Json<BlogResponse>, BlogError> {
    let blog = state.repo().update(&id, patch).await?;
    Ok(Json(BlogResponse {
        success: true,
        blog,
    }))
}

/// DELETE /api/blogs/{id}
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, BlogError> {
    if !state.repo().delete(&id).await? {
        return Err(BlogError::NotFound);
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "Blog deleted successfully".to_string(),
    }))
}

// ============================================================================
// Public handlers
// ============================================================================

/// GET /api/public/blogs - Published blogs, newest first
pub async fn list_published(
    State(state): State<AppState>,
    Query(q): Query<PublicListQuery>,
) -> Result<Json<BlogListResponse>, BlogError> {
    let blogs = state.repo().list_all().await?;
    let category = q.category.as_deref().filter(|c| !c.is_empty() && *c != "all");
    Ok(Json(BlogListResponse {
        success: true,
        blogs: query::published(&blogs, category),
    }))
}

/// GET /api/public/blogs/{slug} - Published blog with related posts
pub async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicBlogResponse>, BlogError> {
    let blogs = state.repo().list_all().await?;
    let blog = query::find_published(&blogs, &slug).ok_or(BlogError::NotFound)?;
    let related = query::related(&blogs, blog, RELATED_LIMIT);
    Ok(Json(PublicBlogResponse {
        success: true,
        blog: blog.clone(),
        related,
    }))
}

/// GET /api/public/categories - Categories of published blogs
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, BlogError> {
    let blogs = state.repo().list_all().await?;
    Ok(Json(CategoriesResponse {
        success: true,
        categories: query::categories(&query::published(&blogs, None)),
    }))
}
