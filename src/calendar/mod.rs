// Calendar import pipeline
// raw text -> reader -> normalizer -> bucketer. Pure and synchronous; the
// async edges (file reads, the remote exchange) live in `session`.

use crate::error::AppResult;
use crate::models::{MonthlyEvents, RemoteEvent};

pub mod bucket;
pub mod common;
pub mod google;
pub mod normalize;
pub mod reader;

pub use bucket::bucket_events;
pub use google::{build_authorization_url, fetch_remote_events, CalendarExchange, HttpCalendarExchange};
pub use normalize::{normalize_blocks, normalize_remote, Normalized};
pub use reader::{read_calendar, Block, CalendarTree, Property};

/// Fully bucketed import result.
#[derive(Debug, Clone, Default)]
pub struct ParsedCalendar {
    pub monthly: MonthlyEvents,
    pub skipped: usize,
}

/// Parses iCalendar text all the way to month buckets.
/// A `FormatError` aborts with nothing produced.
pub fn parse_ics(text: &str) -> AppResult<ParsedCalendar> {
    let tree = read_calendar(text)?;
    let normalized = normalize_blocks(&tree);
    Ok(ParsedCalendar {
        skipped: normalized.skipped,
        monthly: bucket_events(normalized.events),
    })
}

/// Buckets records received from the remote exchange.
pub fn parse_remote(records: &[RemoteEvent]) -> ParsedCalendar {
    let normalized = normalize_remote(records);
    ParsedCalendar {
        skipped: normalized.skipped,
        monthly: bucket_events(normalized.events),
    }
}
