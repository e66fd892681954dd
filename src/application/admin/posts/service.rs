use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::application::repos::{PostsRepo, PostsWriteRepo};

/// Source of the current time for write timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        // storage keeps microseconds
        now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
            .unwrap_or(now)
    }
}

/// `now`, or one microsecond past `previous` when the clock has not moved on.
pub fn next_updated_at(previous: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) default_author: String,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        default_author: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            clock: Arc::new(SystemClock),
            default_author: default_author.into(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
