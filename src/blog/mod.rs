/*!
 * Blog Domain
 * Entity, derived statistics and read-side views shared by server and client
 */
pub mod model;
pub mod query;
pub mod stats;

pub use model::{Blog, BlogCollection, BlogPatch, BlogStatus, NewBlog, BLOG_CATEGORIES};
pub use stats::{compute_stats, generate_slug, ReadingStats};
