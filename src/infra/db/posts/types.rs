use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) excerpt: String,
    pub(crate) featured_image: Option<String>,
    pub(crate) images: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) published: bool,
    pub(crate) published_at: Option<OffsetDateTime>,
    pub(crate) author: String,
    pub(crate) read_time: i32,
    pub(crate) seo_title: Option<String>,
    pub(crate) seo_description: Option<String>,
    pub(crate) seo_keywords: Vec<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            featured_image: row.featured_image,
            images: row.images,
            tags: row.tags,
            published: row.published,
            published_at: row.published_at,
            author: row.author,
            read_time: u32::try_from(row.read_time).unwrap_or(1).max(1),
            seo_title: row.seo_title,
            seo_description: row.seo_description,
            seo_keywords: row.seo_keywords,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `read_time` as stored; the column is a signed integer.
pub(crate) fn read_time_column(minutes: u32) -> i32 {
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
