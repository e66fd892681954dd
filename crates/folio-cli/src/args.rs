//! Command-line surface for `folio-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "folio-cli", version, about = "Folio blog API CLI", long_about = None)]
pub struct Cli {
    /// API base URL, e.g. <https://example.com>
    #[arg(long, env = "FOLIO_SITE_URL")]
    pub site: Option<String>,

    /// Path to file containing the admin key (takes precedence over env)
    #[arg(long, env = "FOLIO_ADMIN_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Admin key from `FOLIO_ADMIN_KEY`; there is no flag so it stays out of shell history.
    #[arg(skip = std::env::var("FOLIO_ADMIN_KEY").ok())]
    pub admin_key_env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Blog posts (list/read/write/publish)
    Posts(PostsArgs),
    /// Tags in use
    Tags(TagsArgs),
    /// Image uploads
    Uploads(UploadsArgs),
    /// Structured data and page metadata
    Seo(SeoArgs),
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List one page of posts
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Include drafts (needs the admin key)
        #[arg(long, default_value_t = false)]
        drafts: bool,
    },
    /// Page through posts interactively, reading filter commands from stdin
    Browse {
        #[arg(long, default_value_t = folio_api_types::DEFAULT_PAGE_SIZE)]
        limit: u32,
        #[arg(long, default_value_t = false)]
        drafts: bool,
    },
    /// Get a post by slug
    Get { slug: String },
    /// Posts sharing a tag with the given post
    Related {
        slug: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Create a post
    Create(Box<DraftArgs>),
    /// Load a post, apply changes and save it
    Edit {
        slug: String,
        #[command(flatten)]
        draft: Box<DraftArgs>,
    },
    /// Mark a post as published
    Publish { slug: String },
    /// Return a post to draft
    Unpublish { slug: String },
    /// Delete a post
    Delete { slug: String },
}

/// Field edits applied to an editor draft.
#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    /// Read the HTML content from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,
    #[arg(long)]
    pub excerpt: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub published: Option<bool>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long = "remove-tag")]
    pub remove_tags: Vec<String>,
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    #[arg(long = "remove-keyword")]
    pub remove_keywords: Vec<String>,
    /// Upload a local image and use it as the featured image
    #[arg(long)]
    pub featured_image: Option<PathBuf>,
    #[arg(long, default_value_t = false, conflicts_with = "featured_image")]
    pub clear_featured_image: bool,
    /// Upload a local image and append it to the gallery
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
    /// Drop a gallery image by URL
    #[arg(long = "remove-image")]
    pub remove_images: Vec<String>,
    #[arg(long)]
    pub seo_title: Option<String>,
    #[arg(long)]
    pub seo_description: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub action: TagsCmd,
}

#[derive(Subcommand, Debug)]
pub enum TagsCmd {
    /// List tags in use, sorted
    List {
        /// Include tags only used by drafts (needs the admin key)
        #[arg(long, default_value_t = false)]
        all: bool,
    },
}

#[derive(Parser, Debug)]
pub struct UploadsArgs {
    #[command(subcommand)]
    pub action: UploadsCmd,
}

#[derive(Subcommand, Debug)]
pub enum UploadsCmd {
    /// Upload an image file
    Upload { file: PathBuf },
}

#[derive(Parser, Debug)]
pub struct SeoArgs {
    #[command(subcommand)]
    pub action: SeoCmd,
}

#[derive(Subcommand, Debug)]
pub enum SeoCmd {
    /// JSON-LD documents for a page
    StructuredData {
        #[arg(long = "type", value_enum, default_value_t = PageKindArg::Website)]
        kind: PageKindArg,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Head metadata for a post
    Metadata { slug: String },
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum PageKindArg {
    Website,
    Blog,
}

impl PageKindArg {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKindArg::Website => "website",
            PageKindArg::Blog => "blog",
        }
    }
}

impl fmt::Display for PageKindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
