//! Filter and pagination state for browsing posts.
//!
//! Every fetch is issued with a sequence token. Only the response carrying
//! the most recently issued token is applied, so a slow answer to an older
//! filter never replaces the page for the current one.

#![deny(clippy::all, clippy::pedantic)]

use folio_api_types::{BlogListQuery, BlogListResponse};

/// Pages shown either side of the current one.
const PAGER_DELTA: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilters {
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// One user edit to the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingAction {
    /// Select a tag; selecting the active tag again clears it.
    Tag(Option<String>),
    Search(Option<String>),
    Page(u32),
    Next,
    Prev,
    Clear,
    Refresh,
    Quit,
}

impl ListingAction {
    /// Parses a browse prompt line such as `tag react`, `page 3` or `next`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        let arg = (!rest.is_empty()).then(|| rest.to_string());
        match word {
            "tag" | "t" => Ok(Self::Tag(arg)),
            "search" | "s" => Ok(Self::Search(arg)),
            "page" => rest
                .parse::<u32>()
                .map(Self::Page)
                .map_err(|_| format!("not a page number: {rest}")),
            "next" | "n" => Ok(Self::Next),
            "prev" | "p" => Ok(Self::Prev),
            "clear" => Ok(Self::Clear),
            "" | "refresh" | "r" => Ok(Self::Refresh),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

/// Entry in the pager: a page number or an elided run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u32),
    Gap,
}

/// A fetch to perform, tagged with its sequence token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub query: BlogListQuery,
}

#[derive(Debug, Clone)]
pub struct ListingState {
    filters: ListingFilters,
    page: u32,
    limit: u32,
    include_drafts: bool,
    issued: u64,
    current: Option<BlogListResponse>,
}

impl ListingState {
    pub fn new(limit: u32, include_drafts: bool) -> Self {
        Self {
            filters: ListingFilters::default(),
            page: 1,
            limit: limit.max(1),
            include_drafts,
            issued: 0,
            current: None,
        }
    }

    pub fn filters(&self) -> &ListingFilters {
        &self.filters
    }

    #[cfg(test)]
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn current(&self) -> Option<&BlogListResponse> {
        self.current.as_ref()
    }

    fn total_pages(&self) -> Option<u32> {
        self.current.as_ref().map(|r| r.total_pages)
    }

    /// Applies an edit. Returns whether the listing must be fetched again.
    /// Filter changes reset to the first page.
    pub fn apply(&mut self, action: ListingAction) -> bool {
        match action {
            ListingAction::Tag(tag) => {
                let tag = normalize(tag).map(|t| t.to_lowercase());
                let next = if tag.is_some() && tag == self.filters.tag {
                    None
                } else {
                    tag
                };
                self.filters.tag = next;
                self.page = 1;
                true
            }
            ListingAction::Search(search) => {
                self.filters.search = normalize(search);
                self.page = 1;
                true
            }
            ListingAction::Page(page) => {
                let last = self.total_pages().unwrap_or(u32::MAX).max(1);
                let page = page.clamp(1, last);
                let changed = page != self.page;
                self.page = page;
                changed
            }
            ListingAction::Next => match self.total_pages() {
                Some(total) if self.page < total => {
                    self.page += 1;
                    true
                }
                _ => false,
            },
            ListingAction::Prev => {
                if self.page > 1 {
                    self.page -= 1;
                    true
                } else {
                    false
                }
            }
            ListingAction::Clear => {
                self.filters = ListingFilters::default();
                self.page = 1;
                true
            }
            ListingAction::Refresh => true,
            ListingAction::Quit => false,
        }
    }

    /// Issues a new token; any response to an earlier one is now stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            token: self.issued,
            query: BlogListQuery {
                page: Some(self.page),
                limit: Some(self.limit),
                tag: self.filters.tag.clone(),
                search: self.filters.search.clone(),
                published: (!self.include_drafts).then_some(true),
            },
        }
    }

    pub fn is_latest(&self, token: u64) -> bool {
        token == self.issued
    }

    /// Stores `response` if `token` is the latest issued one. Returns
    /// whether it was applied.
    pub fn accept(&mut self, token: u64, response: BlogListResponse) -> bool {
        if !self.is_latest(token) {
            return false;
        }
        self.page = response.page;
        self.limit = response.limit;
        self.current = Some(response);
        true
    }

    /// Pager entries: first and last page always, the current page with
    /// two neighbours each side, gaps for anything elided. Empty when
    /// there is at most one page.
    pub fn visible_pages(&self) -> Vec<PageMarker> {
        let Some(response) = self.current.as_ref() else {
            return Vec::new();
        };
        visible_pages(response.page, response.total_pages)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn visible_pages(current: u32, total_pages: u32) -> Vec<PageMarker> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let low = current.saturating_sub(PAGER_DELTA).max(2);
    let high = current.saturating_add(PAGER_DELTA).min(total_pages - 1);

    let mut markers = vec![PageMarker::Page(1)];
    if current > PAGER_DELTA + 2 {
        markers.push(PageMarker::Gap);
    }
    markers.extend((low..=high).map(PageMarker::Page));
    if current.saturating_add(PAGER_DELTA) < total_pages - 1 {
        markers.push(PageMarker::Gap);
    }
    markers.push(PageMarker::Page(total_pages));
    markers
}
