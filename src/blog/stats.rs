/**
 * Slug and reading statistics
 * Pure helpers shared by the server repositories and the sync client
 */
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Average reading speed used for the reading time estimate.
pub const WORDS_PER_MINUTE: u32 = 200;

lazy_static::lazy_static! {
    static ref NON_SLUG_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Word count and estimated reading time (minutes) derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub word_count: u32,
    pub reading_time: u32,
}

/// Build a URL slug from a title.
///
/// `"Hello, World!  Foo"` becomes `"hello-world-foo"`. Titles with no
/// ASCII alphanumerics produce an empty string.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Count the words of an HTML fragment and estimate its reading time.
pub fn compute_stats(html: &str) -> ReadingStats {
    let plain = HTML_TAG.replace_all(html, "");
    let word_count = plain.split_whitespace().count() as u32;
    ReadingStats {
        word_count,
        reading_time: word_count.div_ceil(WORDS_PER_MINUTE).max(1),
    }
}
