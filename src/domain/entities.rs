//! Domain entities mirrored from persistent storage.

use folio_api_types::BlogPost;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
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
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    /// Timestamp used for newest-first ordering.
    pub fn sort_key(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

impl From<PostRecord> for BlogPost {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            slug: record.slug,
            content: record.content,
            excerpt: record.excerpt,
            featured_image: record.featured_image,
            images: record.images,
            tags: record.tags,
            published: record.published,
            published_at: record.published_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            author: record.author,
            read_time: record.read_time,
            seo_title: record.seo_title,
            seo_description: record.seo_description,
            seo_keywords: record.seo_keywords,
        }
    }
}
