//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Listing filters. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQueryFilter {
    /// Exact, already-normalized tag.
    pub tag: Option<String>,
    /// Case-insensitive substring over title, content and excerpt.
    pub search: Option<String>,
    pub published_only: bool,
}

impl PostQueryFilter {
    /// In-process evaluation of the filter, shared by non-SQL adapters.
    pub fn matches(&self, post: &PostRecord) -> bool {
        if self.published_only && !post.published {
            return false;
        }
        if let Some(tag) = self.tag.as_deref()
            && !post.has_tag(tag)
        {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let hit = [&post.title, &post.content, &post.excerpt]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<OffsetDateTime>,
    pub author: String,
    pub read_time: u32,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<OffsetDateTime>,
    pub author: String,
    pub read_time: u32,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts matching `filter`, newest first, windowed by `page`.
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError>;

    /// Distinct tags in use, sorted.
    async fn list_tags(&self, published_only: bool) -> Result<Vec<String>, RepoError>;

    /// Published posts sharing at least one of `tags`, excluding `exclude`.
    async fn list_related(
        &self,
        exclude: Uuid,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Every published post, newest first.
    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Fails with [`RepoError::Duplicate`] when the slug is taken.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
