//! Offset pagination for post listings.

use serde::Serialize;

/// Page size bounds applied to caller-supplied limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePolicy {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self {
            default_size: folio_api_types::DEFAULT_PAGE_SIZE,
            max_size: 50,
        }
    }
}

impl PageSizePolicy {
    /// Clamp a raw limit into `[1, max_size]`; absent or non-positive values
    /// fall back to the default.
    pub fn resolve_limit(&self, requested: Option<i64>) -> u32 {
        match requested {
            Some(value) if value >= 1 => {
                u32::try_from(value.min(i64::from(self.max_size))).unwrap_or(self.max_size)
            }
            _ => self.default_size.clamp(1, self.max_size.max(1)),
        }
    }
}

/// Resolved window into a filtered, ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Move the requested page into `[1, max(total_pages, 1)]`.
    pub fn clamp_to(self, total: u64) -> Self {
        let last = total_pages(total, self.limit).max(1);
        Self {
            page: self.page.clamp(1, last),
            limit: self.limit,
        }
    }
}

/// `ceil(total / limit)`, saturating at `u32::MAX`.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// Parse a raw page value; anything unusable becomes page 1.
pub fn parse_page(requested: Option<i64>) -> u32 {
    match requested {
        Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// One page of results plus the metadata listing clients render.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(total, request.limit),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> OffsetPage<U> {
        OffsetPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
