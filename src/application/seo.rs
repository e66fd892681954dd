//! JSON-LD structured data and page metadata for search engines.
//!
//! Everything here is a pure function of a post (optional) and the site
//! profile, so handlers and tests can call it without touching storage.

use folio_api_types::{PageKind, PageMetadata};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use crate::application::site::SiteProfile;
use crate::domain::content::{text_content, word_count};
use crate::domain::entities::PostRecord;

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Structured data blocks for a page, in emission order.
///
/// `kind` selects the site-level block; a present post adds its article and
/// breadcrumb trail after it.
pub fn structured_data(kind: PageKind, post: Option<&PostRecord>, site: &SiteProfile) -> Vec<Value> {
    let mut blocks = Vec::with_capacity(3);
    blocks.push(match kind {
        PageKind::Website => website_schema(site),
        PageKind::Blog => blog_schema(site),
    });

    if let Some(post) = post {
        blocks.push(article_schema(post, site));
        blocks.push(breadcrumb_schema(post, site));
    }

    blocks
}

pub fn website_schema(site: &SiteProfile) -> Value {
    let mut author = person(&site.author, site);
    author["jobTitle"] = json!(site.job_title);
    if !site.same_as.is_empty() {
        author["sameAs"] = json!(site.same_as);
    }

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "WebSite",
        "name": site.name,
        "description": site.description,
        "url": site.base_url,
        "author": author,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}?search={{search_term_string}}", site.blog_url()),
            },
            "query-input": "required name=search_term_string",
        },
    })
}

pub fn blog_schema(site: &SiteProfile) -> Value {
    let mut author = person(&site.author, site);
    author["jobTitle"] = json!(site.job_title);

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Blog",
        "name": site.blog_name,
        "description": site.blog_description,
        "url": site.blog_url(),
        "author": author,
        "publisher": person(&site.author, site),
    })
}

pub fn article_schema(post: &PostRecord, site: &SiteProfile) -> Value {
    let url = site.post_url(&post.slug);
    let mut article = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.excerpt,
        "author": person(&post.author, site),
        "publisher": person(&site.author, site),
        "dateModified": rfc3339(post.updated_at),
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": url,
        },
        "url": url,
        "keywords": post.tags.join(", "),
        "wordCount": article_word_count(&post.content),
        "timeRequired": format!("PT{}M", post.read_time),
        "articleSection": site.article_section,
        "inLanguage": site.language,
    });

    if let Some(image) = post.featured_image.as_deref() {
        article["image"] = json!(site.url_for(image));
    }
    if let Some(published_at) = post.published_at {
        article["datePublished"] = json!(rfc3339(published_at));
    }

    article
}

pub fn breadcrumb_schema(post: &PostRecord, site: &SiteProfile) -> Value {
    let crumbs = [
        ("Home", site.base_url.clone()),
        ("Blog", site.blog_url()),
        (post.title.as_str(), site.post_url(&post.slug)),
    ];

    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(index, (name, item))| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": name,
                "item": item,
            })
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

/// Head metadata for a post page.
pub fn page_metadata(post: &PostRecord, site: &SiteProfile) -> PageMetadata {
    let title = post
        .seo_title
        .clone()
        .unwrap_or_else(|| format!("{} | {}", post.title, site.name));
    let description = post
        .seo_description
        .clone()
        .unwrap_or_else(|| post.excerpt.clone());
    let keywords = if post.seo_keywords.is_empty() {
        post.tags.clone()
    } else {
        post.seo_keywords.clone()
    };

    PageMetadata {
        title,
        description,
        keywords,
        canonical_url: site.post_url(&post.slug),
        og_image: post.featured_image.as_deref().map(|image| site.url_for(image)),
        published_time: post.published_at,
        modified_time: post.updated_at,
        author: post.author.clone(),
        tags: post.tags.clone(),
    }
}

fn person(name: &str, site: &SiteProfile) -> Value {
    json!({
        "@type": "Person",
        "name": name,
        "url": site.base_url,
    })
}

fn rfc3339(at: time::OffsetDateTime) -> Option<String> {
    at.format(&Rfc3339).ok()
}

fn article_word_count(html: &str) -> u32 {
    match text_content(html) {
        Ok(text) => word_count(&text),
        Err(_) => word_count(html),
    }
}
