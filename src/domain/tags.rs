//! Tag normalization shared by the write path and listing filters.

/// Normalize a single free-text tag: trimmed and lower-cased.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Normalize a tag list, dropping empties and later duplicates.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.into_iter().filter_map(|tag| normalize_tag(tag.as_ref())) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Trim keywords and drop empties and exact duplicates. Case is preserved.
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw.into_iter() {
        let keyword = keyword.as_ref().trim();
        if !keyword.is_empty() && !keywords.iter().any(|existing| existing == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}
