//! Site-level constants used by structured data, metadata and the sitemap.

/// Identity of the site and its author, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    /// Absolute base URL without a trailing slash.
    pub base_url: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub job_title: String,
    pub same_as: Vec<String>,
    pub blog_name: String,
    pub blog_description: String,
    pub language: String,
    pub article_section: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            name: "Portfolio".to_string(),
            description: "Personal portfolio and technical blog.".to_string(),
            author: "Site Author".to_string(),
            job_title: "Full Stack Developer".to_string(),
            same_as: Vec::new(),
            blog_name: "Blog".to_string(),
            blog_description: "Articles about software development.".to_string(),
            language: "en-US".to_string(),
            article_section: "Technology".to_string(),
        }
    }
}

impl SiteProfile {
    /// Absolute URL for a site path such as `/blog/my-post`.
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            return self.base_url.clone();
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }

    pub fn post_url(&self, slug: &str) -> String {
        self.url_for(&format!("/blog/{slug}"))
    }

    pub fn blog_url(&self) -> String {
        self.url_for("/blog")
    }
}

/// Strip trailing slashes so paths can be appended uniformly.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
