#![deny(clippy::all, clippy::pedantic)]

use std::fmt::Write as _;

use serde::Serialize;

use crate::client::CliError;
use crate::listing::{ListingState, PageMarker};

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Decode(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

/// Text view of the current listing page with its pager.
pub fn render_listing(state: &ListingState) -> String {
    let mut out = String::new();
    let filters = state.filters();
    let _ = writeln!(
        out,
        "tag: {}  search: {}",
        filters.tag.as_deref().unwrap_or("-"),
        filters.search.as_deref().unwrap_or("-"),
    );

    let Some(response) = state.current() else {
        out.push_str("loading...\n");
        return out;
    };

    if response.posts.is_empty() {
        out.push_str("No blog posts found\n");
        return out;
    }

    for post in &response.posts {
        let status = if post.published { " " } else { "*" };
        let _ = writeln!(
            out,
            "{status} {:<32} {} ({} min) [{}]",
            post.slug,
            post.title,
            post.read_time,
            post.tags.join(", "),
        );
    }

    let pager: Vec<String> = state
        .visible_pages()
        .into_iter()
        .map(|marker| match marker {
            PageMarker::Page(page) if page == response.page => format!("[{page}]"),
            PageMarker::Page(page) => page.to_string(),
            PageMarker::Gap => "...".to_string(),
        })
        .collect();
    if !pager.is_empty() {
        let _ = writeln!(out, "pages: {}", pager.join(" "));
    }
    let _ = writeln!(out, "{} posts", response.total);
    out
}
