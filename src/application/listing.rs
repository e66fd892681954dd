//! Read side of the blog: filtered listings, tag cloud, detail and related posts.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{OffsetPage, PageRequest, PageSizePolicy, parse_page};
use crate::application::repos::{PostQueryFilter, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::tags::{normalize_tag, normalize_tags};

const RELATED_DEFAULT_LIMIT: u32 = 3;
const RELATED_MAX_LIMIT: u32 = 12;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("blog post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Raw listing parameters as received from a caller.
///
/// Page and limit stay signed so out-of-range values can be clamped rather
/// than rejected.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub published_only: bool,
}

impl ListingQuery {
    fn to_filter(&self) -> PostQueryFilter {
        PostQueryFilter {
            tag: self.tag.as_deref().and_then(normalize_tag),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            published_only: self.published_only,
        }
    }
}

#[derive(Clone)]
pub struct ListingService {
    posts: Arc<dyn PostsRepo>,
    policy: PageSizePolicy,
}

impl ListingService {
    pub fn new(posts: Arc<dyn PostsRepo>, policy: PageSizePolicy) -> Self {
        Self { posts, policy }
    }

    /// One page of posts, newest first, with the page clamped into range.
    pub async fn list(&self, query: &ListingQuery) -> Result<OffsetPage<PostRecord>, ListingError> {
        let filter = query.to_filter();
        let limit = self.policy.resolve_limit(query.limit);
        let requested = PageRequest::new(parse_page(query.page), limit);

        let total = self.posts.count_posts(&filter).await?;
        let request = requested.clamp_to(total);
        if request.page != requested.page {
            debug!(
                target = "folio::listing",
                requested = requested.page,
                clamped = request.page,
                total,
                "listing page clamped"
            );
        }

        let items = if total == 0 {
            Vec::new()
        } else {
            self.posts.list_posts(&filter, request).await?
        };

        Ok(OffsetPage::new(items, total, request))
    }

    pub async fn tags(&self, published_only: bool) -> Result<Vec<String>, ListingError> {
        Ok(self.posts.list_tags(published_only).await?)
    }

    /// Look up a post; drafts are only visible when `include_drafts` is set.
    pub async fn find_by_slug(
        &self,
        slug: &str,
        include_drafts: bool,
    ) -> Result<PostRecord, ListingError> {
        match self.posts.find_by_slug(slug).await? {
            Some(post) if post.published || include_drafts => Ok(post),
            _ => Err(ListingError::NotFound),
        }
    }

    /// Published posts sharing a tag with the post at `slug`.
    pub async fn related(
        &self,
        slug: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PostRecord>, ListingError> {
        let post = self.find_by_slug(slug, false).await?;
        let tags = normalize_tags(&post.tags);
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let limit = limit
            .unwrap_or(RELATED_DEFAULT_LIMIT)
            .clamp(1, RELATED_MAX_LIMIT);
        Ok(self.posts.list_related(post.id, &tags, limit).await?)
    }

    pub async fn published(&self) -> Result<Vec<PostRecord>, ListingError> {
        Ok(self.posts.list_published().await?)
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};
    use uuid::Uuid;

    use super::*;
    use crate::infra::memory::MemoryRepositories;

    const BASE: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

    /// `index` 1 is the newest post.
    fn post(index: i64, tags: &[&str], published: bool) -> PostRecord {
        let at = BASE - Duration::hours(index);
        PostRecord {
            id: Uuid::new_v4(),
            slug: format!("post-{index}"),
            title: format!("Post {index}"),
            content: format!("<p>Body of post {index}</p>"),
            excerpt: format!("Excerpt {index}"),
            featured_image: None,
            images: Vec::new(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            published,
            published_at: published.then_some(at),
            author: "Author".to_string(),
            read_time: 1,
            seo_title: None,
            seo_description: None,
            seo_keywords: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    async fn service_with(posts: Vec<PostRecord>) -> ListingService {
        let repos = Arc::new(MemoryRepositories::new());
        repos.seed(posts).await;
        ListingService::new(repos, PageSizePolicy::default())
    }

    fn published_query() -> ListingQuery {
        ListingQuery {
            published_only: true,
            ..ListingQuery::default()
        }
    }

    #[tokio::test]
    async fn second_page_of_tag_filter_returns_posts_ten_to_eighteen() {
        let mut posts: Vec<PostRecord> = (1..=25).map(|i| post(i, &["react"], true)).collect();
        posts.extend((26..=30).map(|i| post(i, &["rust"], true)));
        let service = service_with(posts).await;

        let page = service
            .list(&ListingQuery {
                page: Some(2),
                limit: Some(9),
                tag: Some("React".to_string()),
                ..published_query()
            })
            .await
            .unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 9);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        let slugs: Vec<_> = page.items.iter().map(|p| p.slug.as_str()).collect();
        let expected: Vec<String> = (10..=18).map(|i| format!("post-{i}")).collect();
        assert_eq!(slugs, expected);
    }

    #[tokio::test]
    async fn page_sizes_never_exceed_limit() {
        let posts: Vec<PostRecord> = (1..=23).map(|i| post(i, &[], true)).collect();
        let service = service_with(posts).await;

        for limit in 1..=12 {
            let mut seen = 0;
            let mut page_no = 1;
            loop {
                let page = service
                    .list(&ListingQuery {
                        page: Some(page_no),
                        limit: Some(limit),
                        ..published_query()
                    })
                    .await
                    .unwrap();
                assert!(page.items.len() <= limit as usize);
                assert_eq!(page.total_pages, 23u64.div_ceil(limit as u64) as u32);
                seen += page.items.len();
                if page_no >= i64::from(page.total_pages) {
                    break;
                }
                page_no += 1;
            }
            assert_eq!(seen, 23);
        }
    }

    #[tokio::test]
    async fn filters_combine_with_and() {
        let mut match_both = post(1, &["rust"], true);
        match_both.title = "Async Rust in practice".to_string();
        let mut tag_only = post(2, &["rust"], true);
        tag_only.title = "Ownership".to_string();
        let mut search_only = post(3, &["go"], true);
        search_only.content = "<p>async everywhere</p>".to_string();
        let mut draft = post(4, &["rust"], false);
        draft.title = "async draft".to_string();
        let service = service_with(vec![match_both, tag_only, search_only, draft]).await;

        let page = service
            .list(&ListingQuery {
                tag: Some("rust".to_string()),
                search: Some("ASYNC".to_string()),
                ..published_query()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "post-1");
    }

    #[tokio::test]
    async fn search_covers_excerpt_and_content() {
        let mut by_excerpt = post(1, &[], true);
        by_excerpt.excerpt = "A note on Tokio".to_string();
        let mut by_content = post(2, &[], true);
        by_content.content = "<p>tokio runtime</p>".to_string();
        let service = service_with(vec![by_excerpt, by_content, post(3, &[], true)]).await;

        let page = service
            .list(&ListingQuery {
                search: Some("tokio".to_string()),
                ..published_query()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn tag_filter_is_exact() {
        let service = service_with(vec![
            post(1, &["react"], true),
            post(2, &["react-native"], true),
        ])
        .await;

        let page = service
            .list(&ListingQuery {
                tag: Some("react".to_string()),
                ..published_query()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|p| p.has_tag("react")));
    }

    #[tokio::test]
    async fn out_of_range_pages_are_clamped() {
        let posts: Vec<PostRecord> = (1..=5).map(|i| post(i, &[], true)).collect();
        let service = service_with(posts).await;

        let beyond = service
            .list(&ListingQuery {
                page: Some(40),
                limit: Some(2),
                ..published_query()
            })
            .await
            .unwrap();
        assert_eq!(beyond.page, 3);
        assert_eq!(beyond.items.len(), 1);

        let negative = service
            .list(&ListingQuery {
                page: Some(-1),
                ..published_query()
            })
            .await
            .unwrap();
        assert_eq!(negative.page, 1);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_public_lookups() {
        let service = service_with(vec![post(1, &["rust"], false)]).await;

        assert!(matches!(
            service.find_by_slug("post-1", false).await,
            Err(ListingError::NotFound)
        ));
        assert!(service.find_by_slug("post-1", true).await.is_ok());
        assert!(service.tags(true).await.unwrap().is_empty());
        assert_eq!(service.tags(false).await.unwrap(), vec!["rust"]);
    }

    #[tokio::test]
    async fn related_posts_share_a_tag_and_exclude_self() {
        let service = service_with(vec![
            post(1, &["rust", "web"], true),
            post(2, &["web"], true),
            post(3, &["go"], true),
            post(4, &["rust"], false),
            post(5, &["rust"], true),
        ])
        .await;

        let related = service.related("post-1", None).await.unwrap();
        let slugs: Vec<_> = related.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["post-2", "post-5"]);
    }
}
