use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{PostQueryFilter, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::infra::db::map_sqlx_error;

use super::types::PostRow;
use crate::infra::db::{NEWEST_FIRST, PostgresRepositories};

const RELATED_SQL: &str = "SELECT p.id, p.slug, p.title, p.content, p.excerpt, p.featured_image, \
     p.images, p.tags, p.published, p.published_at, p.author, p.read_time, \
     p.seo_title, p.seo_description, p.seo_keywords, p.created_at, p.updated_at \
     FROM posts p \
     WHERE p.published AND p.id <> $1 AND p.tags && $2";

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        Self::apply_filter(&mut qb, filter);
        qb.push(NEWEST_FIRST);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let mut qb = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn list_tags(&self, published_only: bool) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT tag FROM posts, unnest(tags) AS tag \
             WHERE ($1 = FALSE OR published) ORDER BY tag",
        )
        .bind(published_only)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_related(
        &self,
        exclude: Uuid,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!("{RELATED_SQL}{NEWEST_FIRST} LIMIT $3");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(exclude)
            .bind(tags.to_vec())
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.published ");
        qb.push(NEWEST_FIRST);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.slug = ");
        qb.push_bind(slug);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}
