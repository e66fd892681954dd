//! Post body handling: sanitization, plain-text extraction, and the metrics
//! derived from it (word count, read time, fallback excerpt).

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use ammonia::Builder as AmmoniaBuilder;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use once_cell::sync::Lazy;

use crate::domain::error::DomainError;

/// Reading speed used for read-time estimates.
pub const WORDS_PER_MINUTE: u32 = 200;

/// Length of an excerpt derived from the body when none was supplied.
pub const DERIVED_EXCERPT_CHARS: usize = 160;

static SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(build_sanitizer);

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "code",
        "div",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "span",
        "strong",
        "sub",
        "sup",
        "u",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);
    builder.add_generic_attributes(&["class", "id"]);
    builder.add_tag_attributes("img", &["src", "alt", "title", "width", "height", "loading"]);
    builder.add_tag_attributes("a", &["href", "title", "target"]);
    builder.link_rel(Some("noopener noreferrer"));

    builder
}

/// Strip scripts, event handlers and unknown markup from a post body.
pub fn sanitize_html(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn text_content(html: &str) -> Result<String, DomainError> {
    let buffer = Rc::new(RefCell::new(String::with_capacity(html.len())));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                // block boundaries must not glue words together
                element!("*", {
                    let buffer = Rc::clone(&buffer);
                    move |_el| {
                        buffer.borrow_mut().push(' ');
                        Ok(())
                    }
                }),
                text!("*", {
                    let buffer = Rc::clone(&buffer);
                    move |t| {
                        buffer.borrow_mut().push_str(t.as_str());
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| DomainError::validation("content", err.to_string()))?;

    let raw = buffer.borrow();
    let decoded = decode_entities(&raw);
    Ok(decoded.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Minutes needed to read `words`, never less than one.
pub fn read_time_minutes(words: u32) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Cut `text` to at most `max_chars` characters at a word boundary,
/// appending `...` when anything was dropped.
pub fn derive_excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(boundary) if boundary > 0 => &head[..boundary],
        _ => head,
    };

    format!("{}...", head.trim_end())
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Metrics derived from a sanitized body in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyMetrics {
    pub text: String,
    pub word_count: u32,
    pub read_time: u32,
}

pub fn body_metrics(html: &str) -> Result<BodyMetrics, DomainError> {
    let text = text_content(html)?;
    let word_count = word_count(&text);
    Ok(BodyMetrics {
        read_time: read_time_minutes(word_count),
        word_count,
        text,
    })
}
