//! Post editor: a draft mirroring [`BlogPostInput`] and its submission.
//!
//! A fresh editor creates a post with `POST /api/blogs`; an editor loaded from
//! an existing post saves with `PUT /api/blogs/{slug}`.

#![deny(clippy::all, clippy::pedantic)]

use std::time::Duration;

use folio_api_types::{BlogPost, BlogPostInput};
use reqwest::Method;

use crate::client::{CliError, Ctx};
use crate::io::to_value;
use crate::upload::ImageSlot;

/// Pause between a successful save and the editor closing.
pub const CLOSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    input: BlogPostInput,
}

impl Draft {
    pub fn from_post(post: &BlogPost) -> Self {
        Self {
            input: BlogPostInput {
                title: post.title.clone(),
                content: post.content.clone(),
                excerpt: post.excerpt.clone(),
                featured_image: post.featured_image.clone(),
                images: post.images.clone(),
                tags: post.tags.clone(),
                published: post.published,
                author: post.author.clone(),
                seo_title: post.seo_title.clone(),
                seo_description: post.seo_description.clone(),
                seo_keywords: post.seo_keywords.clone(),
            },
        }
    }

    pub fn input(&self) -> &BlogPostInput {
        &self.input
    }

    pub fn set_title(&mut self, title: String) {
        self.input.title = title;
    }

    pub fn set_content(&mut self, content: String) {
        self.input.content = content;
    }

    pub fn set_excerpt(&mut self, excerpt: String) {
        self.input.excerpt = excerpt;
    }

    pub fn set_author(&mut self, author: String) {
        self.input.author = author;
    }

    pub fn set_published(&mut self, published: bool) {
        self.input.published = published;
    }

    pub fn set_seo_title(&mut self, title: Option<String>) {
        self.input.seo_title = title.filter(|t| !t.trim().is_empty());
    }

    pub fn set_seo_description(&mut self, description: Option<String>) {
        self.input.seo_description = description.filter(|d| !d.trim().is_empty());
    }

    /// Adds a trimmed, lower-cased tag. Returns `false` for blanks and
    /// tags already present in any case.
    pub fn add_tag(&mut self, raw: &str) -> bool {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || self.input.tags.iter().any(|t| t.to_lowercase() == tag) {
            return false;
        }
        self.input.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.input.tags.len();
        let needle = tag.trim().to_lowercase();
        self.input.tags.retain(|t| *t != needle);
        self.input.tags.len() != before
    }

    /// Keywords keep their case and are deduplicated exactly.
    pub fn add_keyword(&mut self, raw: &str) -> bool {
        let keyword = raw.trim();
        if keyword.is_empty() || self.input.seo_keywords.iter().any(|k| k == keyword) {
            return false;
        }
        self.input.seo_keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let before = self.input.seo_keywords.len();
        self.input.seo_keywords.retain(|k| k != keyword.trim());
        self.input.seo_keywords.len() != before
    }

    /// Receives an uploaded image URL: the featured slot is replaced, the
    /// gallery is appended to.
    pub fn place_image(&mut self, slot: ImageSlot, url: String) {
        match slot {
            ImageSlot::Featured => self.input.featured_image = Some(url),
            ImageSlot::Gallery => self.input.images.push(url),
        }
    }

    pub fn clear_featured_image(&mut self) {
        self.input.featured_image = None;
    }

    pub fn remove_gallery_image(&mut self, url: &str) -> bool {
        let before = self.input.images.len();
        self.input.images.retain(|image| image != url);
        self.input.images.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Create,
    Update { slug: String },
}

#[derive(Debug)]
pub struct Editor {
    draft: Draft,
    target: Target,
    close_delay: Duration,
}

/// Result of a successful save.
#[derive(Debug)]
pub struct Saved {
    pub post: BlogPost,
    pub message: &'static str,
    close_delay: Duration,
}

impl Saved {
    /// Holds the confirmation on screen before the session ends.
    pub async fn close(self) -> BlogPost {
        if !self.close_delay.is_zero() {
            tokio::time::sleep(self.close_delay).await;
        }
        self.post
    }
}

impl Editor {
    pub fn create() -> Self {
        Self {
            draft: Draft::default(),
            target: Target::Create,
            close_delay: CLOSE_DELAY,
        }
    }

    pub fn edit(post: &BlogPost) -> Self {
        Self {
            draft: Draft::from_post(post),
            target: Target::Update {
                slug: post.slug.clone(),
            },
            close_delay: CLOSE_DELAY,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = delay;
        self
    }

    #[cfg(test)]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn method(&self) -> Method {
        match self.target {
            Target::Create => Method::POST,
            Target::Update { .. } => Method::PUT,
        }
    }

    pub fn path(&self) -> String {
        match &self.target {
            Target::Create => "api/blogs".to_string(),
            Target::Update { slug } => format!("api/blogs/{slug}"),
        }
    }

    /// Sends the draft once. Failures carry the server's message and are
    /// not retried.
    pub async fn submit(self, ctx: &Ctx) -> Result<Saved, CliError> {
        ctx.require_admin()?;
        let body = to_value(self.draft.input())?;
        let post: BlogPost = ctx
            .request(self.method(), &self.path(), None, Some(body))
            .await?;
        let message = match self.target {
            Target::Create => "Blog post created successfully!",
            Target::Update { .. } => "Blog post updated successfully!",
        };
        Ok(Saved {
            post,
            message,
            close_delay: self.close_delay,
        })
    }
}
