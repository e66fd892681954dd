use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::types::{PostRow, read_time_column};

const RETURNING: &str = " RETURNING id, slug, title, content, excerpt, featured_image, images, tags, \
     published, published_at, author, read_time, seo_title, seo_description, seo_keywords, \
     created_at, updated_at";

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            slug,
            title,
            content,
            excerpt,
            featured_image,
            images,
            tags,
            published,
            published_at,
            author,
            read_time,
            seo_title,
            seo_description,
            seo_keywords,
            created_at,
        } = params;

        let sql = format!(
            "INSERT INTO posts (\
                 id, slug, title, content, excerpt, featured_image, images, tags, \
                 published, published_at, author, read_time, seo_title, seo_description, \
                 seo_keywords, created_at, updated_at\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)\
             {RETURNING}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(slug)
            .bind(title)
            .bind(content)
            .bind(excerpt)
            .bind(featured_image)
            .bind(images)
            .bind(tags)
            .bind(published)
            .bind(published_at)
            .bind(author)
            .bind(read_time_column(read_time))
            .bind(seo_title)
            .bind(seo_description)
            .bind(seo_keywords)
            .bind(created_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            content,
            excerpt,
            featured_image,
            images,
            tags,
            published,
            published_at,
            author,
            read_time,
            seo_title,
            seo_description,
            seo_keywords,
            updated_at,
        } = params;

        let sql = format!(
            "UPDATE posts SET \
                 title = $2, content = $3, excerpt = $4, featured_image = $5, images = $6, \
                 tags = $7, published = $8, published_at = $9, author = $10, read_time = $11, \
                 seo_title = $12, seo_description = $13, seo_keywords = $14, updated_at = $15 \
             WHERE id = $1{RETURNING}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(content)
            .bind(excerpt)
            .bind(featured_image)
            .bind(images)
            .bind(tags)
            .bind(published)
            .bind(published_at)
            .bind(author)
            .bind(read_time_column(read_time))
            .bind(seo_title)
            .bind(seo_description)
            .bind(seo_keywords)
            .bind(updated_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
