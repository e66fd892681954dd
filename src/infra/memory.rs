//! In-process post store used when no database is configured and in tests.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CreatePostParams, HealthCheck, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::PostRecord;

const SLUG_CONSTRAINT: &str = "posts_slug_key";

#[derive(Debug, Default)]
pub struct MemoryRepositories {
    posts: RwLock<HashMap<Uuid, PostRecord>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records as-is, bypassing slug derivation. Used for seeding.
    pub async fn seed(&self, records: impl IntoIterator<Item = PostRecord>) {
        let mut guard = self.posts.write().await;
        for record in records {
            guard.insert(record.id, record);
        }
    }

    async fn matching(&self, filter: &PostQueryFilter) -> Vec<PostRecord> {
        let guard = self.posts.read().await;
        let mut posts: Vec<PostRecord> = guard
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        sort_newest_first(&mut posts);
        posts
    }
}

fn sort_newest_first(posts: &mut [PostRecord]) {
    posts.sort_by_key(|post| Reverse((post.sort_key(), post.created_at, post.id)));
}

fn window<T>(items: Vec<T>, offset: u64, limit: u32) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.matching(filter).await;
        Ok(window(posts, page.offset(), page.limit))
    }

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let guard = self.posts.read().await;
        Ok(guard.values().filter(|post| filter.matches(post)).count() as u64)
    }

    async fn list_tags(&self, published_only: bool) -> Result<Vec<String>, RepoError> {
        let guard = self.posts.read().await;
        let tags: BTreeSet<String> = guard
            .values()
            .filter(|post| post.published || !published_only)
            .flat_map(|post| post.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn list_related(
        &self,
        exclude: Uuid,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let filter = PostQueryFilter {
            published_only: true,
            ..PostQueryFilter::default()
        };
        let related = self
            .matching(&filter)
            .await
            .into_iter()
            .filter(|post| post.id != exclude && tags.iter().any(|tag| post.has_tag(tag)))
            .collect();
        Ok(window(related, 0, limit))
    }

    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError> {
        let filter = PostQueryFilter {
            published_only: true,
            ..PostQueryFilter::default()
        };
        Ok(self.matching(&filter).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let guard = self.posts.read().await;
        Ok(guard.values().find(|post| post.slug == slug).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut guard = self.posts.write().await;
        if guard.values().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: SLUG_CONSTRAINT.to_string(),
            });
        }

        let record = PostRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            content: params.content,
            excerpt: params.excerpt,
            featured_image: params.featured_image,
            images: params.images,
            tags: params.tags,
            published: params.published,
            published_at: params.published_at,
            author: params.author,
            read_time: params.read_time,
            seo_title: params.seo_title,
            seo_description: params.seo_description,
            seo_keywords: params.seo_keywords,
            created_at: params.created_at,
            updated_at: params.created_at,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut guard = self.posts.write().await;
        let record = guard.get_mut(&params.id).ok_or(RepoError::NotFound)?;

        record.title = params.title;
        record.content = params.content;
        record.excerpt = params.excerpt;
        record.featured_image = params.featured_image;
        record.images = params.images;
        record.tags = params.tags;
        record.published = params.published;
        record.published_at = params.published_at;
        record.author = params.author;
        record.read_time = params.read_time;
        record.seo_title = params.seo_title;
        record.seo_description = params.seo_description;
        record.seo_keywords = params.seo_keywords;
        record.updated_at = params.updated_at;

        Ok(record.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut guard = self.posts.write().await;
        guard.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl HealthCheck for MemoryRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
