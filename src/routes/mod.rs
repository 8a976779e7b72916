/**
 * Routes Module
 * API route handlers
 */

pub mod blog;
pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Blog API and public views.
pub fn blog_router() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", get(blog::list_blogs).post(blog::create_blog))
        .route(
            "/api/blogs/{id}",
            get(blog::get_blog)
                .put(blog::update_blog)
                .delete(blog::delete_blog),
        )
        .route("/api/public/blogs", get(blog::list_published))
        .route("/api/public/blogs/{slug}", get(blog::get_published))
        .route("/api/public/categories", get(blog::list_categories))
}

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .route("/health/ready", get(health::health_ready))
}
