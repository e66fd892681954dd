use folio_api_types::{BlogPostInput, BlogPostPatch};
use metrics::counter;
use tracing::info;

use crate::application::repos::{CreatePostParams, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

use super::service::{AdminPostService, next_updated_at};
use super::types::{AdminPostError, NormalizedPost, publication_time};

impl AdminPostService {
    /// Create a post with a slug derived from its title.
    pub async fn create_post(&self, input: BlogPostInput) -> Result<PostRecord, AdminPostError> {
        let post = NormalizedPost::from_input(input, &self.default_author)?;

        let reader = self.reader.clone();
        let slug = match generate_unique_slug_async(&post.title, move |candidate| {
            let reader = reader.clone();
            async move {
                reader
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        {
            Ok(slug) => slug,
            Err(SlugAsyncError::Slug(err)) => match err {
                SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                    return Err(AdminPostError::constraint(
                        "title",
                        "must contain letters or digits",
                    ));
                }
                SlugError::Exhausted { .. } => {
                    return Err(AdminPostError::constraint("slug", "could not be made unique"));
                }
            },
            Err(SlugAsyncError::Predicate(err)) => return Err(AdminPostError::Repo(err)),
        };

        let now = self.clock.now();
        let params = CreatePostParams {
            slug,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            featured_image: post.featured_image,
            images: post.images,
            tags: post.tags,
            published: post.published,
            published_at: publication_time(false, None, post.published, now),
            author: post.author,
            read_time: post.read_time,
            seo_title: post.seo_title,
            seo_description: post.seo_description,
            seo_keywords: post.seo_keywords,
            created_at: now,
        };

        let record = self.writer.create_post(params).await?;
        counter!("folio_posts_created_total").increment(1);
        info!(
            target = "folio::admin::posts",
            slug = %record.slug,
            published = record.published,
            "post created"
        );

        Ok(record)
    }

    /// Apply a partial update to the post at `slug`.
    ///
    /// The slug is stable across edits, including title changes.
    pub async fn update_post(
        &self,
        slug: &str,
        patch: BlogPostPatch,
    ) -> Result<PostRecord, AdminPostError> {
        let existing = self
            .reader
            .find_by_slug(slug)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        let merged = merge_patch(&existing, patch);
        let post = NormalizedPost::from_input(merged, &self.default_author)?;

        let now = self.clock.now();
        let params = UpdatePostParams {
            id: existing.id,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            featured_image: post.featured_image,
            images: post.images,
            tags: post.tags,
            published: post.published,
            published_at: publication_time(
                existing.published,
                existing.published_at,
                post.published,
                now,
            ),
            author: post.author,
            read_time: post.read_time,
            seo_title: post.seo_title,
            seo_description: post.seo_description,
            seo_keywords: post.seo_keywords,
            updated_at: next_updated_at(existing.updated_at, now),
        };

        let record = self.writer.update_post(params).await?;
        counter!("folio_posts_updated_total").increment(1);
        info!(
            target = "folio::admin::posts",
            slug = %record.slug,
            published = record.published,
            was_published = existing.published,
            "post updated"
        );

        Ok(record)
    }

    /// Flip the published flag only.
    pub async fn set_published(
        &self,
        slug: &str,
        published: bool,
    ) -> Result<PostRecord, AdminPostError> {
        self.update_post(slug, BlogPostPatch::publish(published))
            .await
    }

    pub async fn delete_post(&self, slug: &str) -> Result<PostRecord, AdminPostError> {
        let existing = self
            .reader
            .find_by_slug(slug)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        self.writer.delete_post(existing.id).await?;
        counter!("folio_posts_deleted_total").increment(1);
        info!(
            target = "folio::admin::posts",
            slug = %existing.slug,
            "post deleted"
        );

        Ok(existing)
    }
}

/// Overlay `patch` on the stored post, producing a full input.
fn merge_patch(existing: &PostRecord, patch: BlogPostPatch) -> BlogPostInput {
    BlogPostInput {
        title: patch.title.unwrap_or_else(|| existing.title.clone()),
        content: patch.content.unwrap_or_else(|| existing.content.clone()),
        excerpt: patch.excerpt.unwrap_or_else(|| existing.excerpt.clone()),
        featured_image: patch
            .featured_image
            .unwrap_or_else(|| existing.featured_image.clone()),
        images: patch.images.unwrap_or_else(|| existing.images.clone()),
        tags: patch.tags.unwrap_or_else(|| existing.tags.clone()),
        published: patch.published.unwrap_or(existing.published),
        author: patch.author.unwrap_or_else(|| existing.author.clone()),
        seo_title: patch.seo_title.unwrap_or_else(|| existing.seo_title.clone()),
        seo_description: patch
            .seo_description
            .unwrap_or_else(|| existing.seo_description.clone()),
        seo_keywords: patch
            .seo_keywords
            .unwrap_or_else(|| existing.seo_keywords.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use time::{Duration, OffsetDateTime, macros::datetime};

    use super::*;
    use crate::application::admin::posts::Clock;
    use crate::application::repos::{PostsRepo, RepoError};
    use crate::infra::memory::MemoryRepositories;

    struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        fn at(start: OffsetDateTime) -> Arc<Self> {
            Arc::new(Self(Mutex::new(start)))
        }

        fn advance(&self, by: Duration) {
            let mut guard = self.0.lock().unwrap();
            *guard += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn service(clock: Arc<ManualClock>) -> (AdminPostService, Arc<MemoryRepositories>) {
        let repos = Arc::new(MemoryRepositories::new());
        let service = AdminPostService::new(repos.clone(), repos.clone(), "Site Author")
            .with_clock(clock);
        (service, repos)
    }

    fn input(title: &str) -> BlogPostInput {
        BlogPostInput {
            title: title.to_string(),
            content: "<p>Body text for the post.</p>".to_string(),
            tags: vec!["React".to_string(), "react".to_string()],
            ..BlogPostInput::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_unique_slugs_from_title() {
        let clock = ManualClock::at(datetime!(2024-03-01 09:00 UTC));
        let (service, _) = service(clock);

        let first = service.create_post(input("Hello World")).await.unwrap();
        let second = service.create_post(input("Hello, World!")).await.unwrap();

        assert_eq!(first.slug, "hello-world");
        assert_eq!(second.slug, "hello-world-2");
        assert_eq!(first.tags, vec!["react"]);
        assert_eq!(first.author, "Site Author");
        assert!(first.published_at.is_none());
    }

    #[tokio::test]
    async fn publishing_on_create_stamps_published_at() {
        let start = datetime!(2024-03-01 09:00 UTC);
        let (service, _) = service(ManualClock::at(start));

        let mut raw = input("Live");
        raw.published = true;
        let post = service.create_post(raw).await.unwrap();

        assert!(post.published);
        assert_eq!(post.published_at, Some(start));
    }

    #[tokio::test]
    async fn toggle_sets_and_clears_published_at() {
        let start = datetime!(2024-03-01 09:00 UTC);
        let clock = ManualClock::at(start);
        let (service, _) = service(clock.clone());
        let draft = service.create_post(input("Toggle Me")).await.unwrap();

        clock.advance(Duration::hours(1));
        let published = service.set_published(&draft.slug, true).await.unwrap();
        assert_eq!(published.published_at, Some(start + Duration::hours(1)));

        clock.advance(Duration::hours(1));
        let republished = service.set_published(&draft.slug, true).await.unwrap();
        assert_eq!(republished.published_at, published.published_at);

        clock.advance(Duration::hours(1));
        let unpublished = service.set_published(&draft.slug, false).await.unwrap();
        assert!(!unpublished.published);
        assert_eq!(unpublished.published_at, None);
    }

    #[tokio::test]
    async fn updated_at_increases_even_when_clock_stalls() {
        let clock = ManualClock::at(datetime!(2024-03-01 09:00 UTC));
        let (service, _) = service(clock);
        let created = service.create_post(input("Stalled")).await.unwrap();

        let first = service
            .update_post(&created.slug, BlogPostPatch::default())
            .await
            .unwrap();
        let second = service
            .update_post(&created.slug, BlogPostPatch::default())
            .await
            .unwrap();

        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn partial_update_keeps_untouched_fields() {
        let clock = ManualClock::at(datetime!(2024-03-01 09:00 UTC));
        let (service, _) = service(clock);
        let mut raw = input("Keep Fields");
        raw.featured_image = Some("/uploads/a.png".to_string());
        let created = service.create_post(raw).await.unwrap();

        let patch = BlogPostPatch {
            title: Some("Renamed".to_string()),
            featured_image: Some(None),
            ..BlogPostPatch::default()
        };
        let updated = service.update_post(&created.slug, patch).await.unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.slug, created.slug);
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.featured_image, None);
        assert_eq!(updated.tags, created.tags);
    }

    #[tokio::test]
    async fn delete_removes_post_and_reports_missing() {
        let clock = ManualClock::at(datetime!(2024-03-01 09:00 UTC));
        let (service, repos) = service(clock);
        let created = service.create_post(input("Short Lived")).await.unwrap();

        service.delete_post(&created.slug).await.unwrap();
        assert!(repos.find_by_slug(&created.slug).await.unwrap().is_none());

        let err = service.delete_post(&created.slug).await.unwrap_err();
        assert!(matches!(err, AdminPostError::NotFound));
    }

    #[tokio::test]
    async fn store_rejects_duplicate_slug() {
        use crate::application::repos::{CreatePostParams, PostsWriteRepo};

        let repos = MemoryRepositories::new();
        let now = datetime!(2024-03-01 09:00 UTC);
        let params = CreatePostParams {
            slug: "taken".to_string(),
            title: "Taken".to_string(),
            content: "<p>x</p>".to_string(),
            excerpt: String::new(),
            featured_image: None,
            images: Vec::new(),
            tags: Vec::new(),
            published: false,
            published_at: None,
            author: "A".to_string(),
            read_time: 1,
            seo_title: None,
            seo_description: None,
            seo_keywords: Vec::new(),
            created_at: now,
        };

        repos.create_post(params.clone()).await.unwrap();
        let err = repos.create_post(params).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }
}
