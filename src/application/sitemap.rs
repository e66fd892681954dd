//! Sitemap service for sitemap.xml and robots.txt generation.
//!
//! Static portfolio pages come first, followed by every published post.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::application::repos::{PostsRepo, RepoError};
use crate::application::site::SiteProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

const STATIC_PAGES: &[(&str, ChangeFrequency, &str)] = &[
    ("/", ChangeFrequency::Weekly, "1.0"),
    ("/blog", ChangeFrequency::Daily, "0.8"),
    ("/projects", ChangeFrequency::Monthly, "0.7"),
];
const POST_PRIORITY: &str = "0.6";

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("failed to list posts: {0}")]
    Posts(#[from] RepoError),
}

#[derive(Clone)]
pub struct SitemapService {
    posts: Arc<dyn PostsRepo>,
    site: Arc<SiteProfile>,
}

impl SitemapService {
    pub fn new(posts: Arc<dyn PostsRepo>, site: Arc<SiteProfile>) -> Self {
        Self { posts, site }
    }

    pub async fn sitemap_xml(&self) -> Result<String, SitemapError> {
        let posts = self.posts.list_published().await?;

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for (path, frequency, priority) in STATIC_PAGES {
            xml.push_str(&sitemap_entry(
                &self.site.url_for(path),
                None,
                *frequency,
                priority,
            ));
        }
        for post in posts {
            xml.push_str(&sitemap_entry(
                &self.site.post_url(&post.slug),
                Some(post.updated_at),
                ChangeFrequency::Monthly,
                POST_PRIORITY,
            ));
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }

    pub fn robots_txt(&self) -> String {
        let sitemap_url = self.site.url_for("/sitemap.xml");
        format!("User-agent: *\nAllow: /\nSitemap: {sitemap_url}\n")
    }
}

fn sitemap_entry(
    loc: &str,
    lastmod: Option<OffsetDateTime>,
    frequency: ChangeFrequency,
    priority: &str,
) -> String {
    let lastmod = lastmod
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .map(|value| format!("<lastmod>{value}</lastmod>"))
        .unwrap_or_default();
    format!(
        "  <url><loc>{}</loc>{lastmod}<changefreq>{}</changefreq><priority>{priority}</priority></url>\n",
        escape_xml(loc),
        frequency.as_str()
    )
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
