use folio_api_types::BlogPostInput;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::domain::content::{DERIVED_EXCERPT_CHARS, body_metrics, derive_excerpt, sanitize_html};
use crate::domain::error::DomainError;
use crate::domain::tags::{normalize_keywords, normalize_tags};

pub const TITLE_MAX_CHARS: usize = 100;
pub const EXCERPT_MAX_CHARS: usize = 300;
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 160;

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("{field} {message}")]
    ConstraintViolation {
        field: &'static str,
        message: &'static str,
    },
    #[error("Blog post not found")]
    NotFound,
    #[error(transparent)]
    Content(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminPostError {
    pub fn constraint(field: &'static str, message: &'static str) -> Self {
        Self::ConstraintViolation { field, message }
    }
}

/// Post fields after validation, trimming, sanitizing and derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub author: String,
    pub read_time: u32,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
}

impl NormalizedPost {
    pub fn from_input(input: BlogPostInput, default_author: &str) -> Result<Self, AdminPostError> {
        let title = input.title.trim().to_string();
        ensure_non_empty(&title, "title")?;
        ensure_max_chars(&title, TITLE_MAX_CHARS, "title")?;

        let content = sanitize_html(input.content.trim());
        ensure_non_empty(&content, "content")?;
        let metrics = body_metrics(&content)?;

        let excerpt = match input.excerpt.trim() {
            "" => derive_excerpt(&metrics.text, DERIVED_EXCERPT_CHARS),
            given => given.to_string(),
        };
        ensure_max_chars(&excerpt, EXCERPT_MAX_CHARS, "excerpt")?;

        let seo_description = non_blank(input.seo_description);
        if let Some(description) = seo_description.as_deref() {
            ensure_max_chars(description, SEO_DESCRIPTION_MAX_CHARS, "seoDescription")?;
        }

        let author = match input.author.trim() {
            "" => default_author.to_string(),
            given => given.to_string(),
        };

        Ok(Self {
            title,
            content,
            excerpt,
            featured_image: non_blank(input.featured_image),
            images: input
                .images
                .into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            tags: normalize_tags(&input.tags),
            published: input.published,
            author,
            read_time: metrics.read_time,
            seo_title: non_blank(input.seo_title),
            seo_description,
            seo_keywords: normalize_keywords(&input.seo_keywords),
        })
    }
}

/// Publication timestamp after a write.
///
/// Set when the flag turns on, cleared when it turns off, kept otherwise.
pub fn publication_time(
    was_published: bool,
    previous: Option<OffsetDateTime>,
    published: bool,
    now: OffsetDateTime,
) -> Option<OffsetDateTime> {
    match (was_published, published) {
        (false, true) => Some(now),
        (true, true) => previous.or(Some(now)),
        (_, false) => None,
    }
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        return Err(AdminPostError::constraint(field, "is required"));
    }
    Ok(())
}

pub fn ensure_max_chars(
    value: &str,
    max: usize,
    field: &'static str,
) -> Result<(), AdminPostError> {
    if value.chars().count() > max {
        return Err(AdminPostError::constraint(field, "is too long"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
