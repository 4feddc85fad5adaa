// Block/record -> CalendarEvent conversion.
// Records without a usable start are skipped and counted, never fatal.

use crate::calendar::common::{self, ResolvedTime};
use crate::calendar::reader::{Block, CalendarTree};
use crate::error::{AppResult, PlannerError};
use crate::models::{CalendarEvent, RemoteEvent, UNTITLED_EVENT};
use chrono::Duration;
use std::collections::HashSet;
use uuid::Uuid;

/// Output of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub events: Vec<CalendarEvent>,
    pub skipped: usize,
}

impl Normalized {
    pub fn total_records(&self) -> usize {
        self.events.len() + self.skipped
    }
}

/// Hands out ids that collide with nothing else in the batch.
struct IdAllocator {
    taken: HashSet<String>,
}

impl IdAllocator {
    fn new<'a>(explicit: impl Iterator<Item = &'a str>) -> Self {
        Self {
            taken: explicit.map(str::to_string).collect(),
        }
    }

    fn resolve(&mut self, explicit: Option<&str>) -> String {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        loop {
            let candidate = Uuid::new_v4().to_string();
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn clean_title(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED_EVENT.to_string())
}

fn text_value(block: &Block, name: &str) -> Option<String> {
    block.value(name).map(common::unescape_text)
}

/// Converts every `VEVENT` in the tree, in document order.
pub fn normalize_blocks(tree: &CalendarTree) -> Normalized {
    let mut ids = IdAllocator::new(tree.events().filter_map(|b| b.value("UID")).map(str::trim));
    let mut out = Normalized::default();

    for block in tree.events() {
        match convert_block(block, &mut ids) {
            Ok(event) => {
                log::debug!("Normalized event: {} ({})", event.title, event.start);
                out.events.push(event);
            }
            Err(e) => {
                log::warn!("Skipping event block at line {}: {}", block.line, e);
                out.skipped += 1;
            }
        }
    }

    log::info!(
        "Normalized {} events from calendar data ({} skipped)",
        out.events.len(),
        out.skipped
    );
    out
}

fn convert_block(block: &Block, ids: &mut IdAllocator) -> AppResult<CalendarEvent> {
    let title = clean_title(text_value(block, "SUMMARY").as_deref());

    let start = block
        .property("DTSTART")
        .and_then(common::parse_ical_datetime)
        .ok_or_else(|| {
            PlannerError::unresolved_date(format!("'{}' has no readable DTSTART", title))
        })?;

    let end = resolve_block_end(block, &start);

    Ok(CalendarEvent {
        id: ids.resolve(block.value("UID")),
        title,
        start: start.instant,
        end,
        all_day: start.date_only,
        description: text_value(block, "DESCRIPTION").unwrap_or_default(),
        location: text_value(block, "LOCATION").unwrap_or_default(),
    })
}

fn resolve_block_end(block: &Block, start: &ResolvedTime) -> chrono::DateTime<chrono::FixedOffset> {
    if let Some(prop) = block.property("DTEND") {
        match common::parse_ical_datetime(prop) {
            Some(end) => return end.instant,
            None => log::warn!("Unreadable DTEND {:?} at line {}", prop.value, prop.line),
        }
    }
    if let Some(prop) = block.property("DURATION") {
        match common::parse_ical_duration(&prop.value)
            .and_then(|duration| start.instant.checked_add_signed(duration))
        {
            Some(end) => return end,
            None => log::warn!("Unusable DURATION {:?} at line {}", prop.value, prop.line),
        }
    }
    if start.date_only {
        start
            .instant
            .checked_add_signed(Duration::days(1))
            .unwrap_or(start.instant)
    } else {
        start.instant
    }
}

/// Converts records from the remote calendar exchange.
pub fn normalize_remote(records: &[RemoteEvent]) -> Normalized {
    let mut ids = IdAllocator::new(records.iter().filter_map(|r| r.id.as_deref()).map(str::trim));
    let mut out = Normalized::default();

    for record in records {
        match convert_remote(record, &mut ids) {
            Ok(event) => out.events.push(event),
            Err(e) => {
                log::warn!("Skipping remote event {:?}: {}", record.id, e);
                out.skipped += 1;
            }
        }
    }

    log::info!(
        "Normalized {} remote events ({} skipped)",
        out.events.len(),
        out.skipped
    );
    out
}

fn convert_remote(record: &RemoteEvent, ids: &mut IdAllocator) -> AppResult<CalendarEvent> {
    let title = clean_title(record.summary.as_deref());

    let start = record
        .start
        .as_ref()
        .and_then(|t| common::parse_remote_datetime(t.date_time.as_deref(), t.date.as_deref()))
        .ok_or_else(|| PlannerError::unresolved_date(format!("'{}' has no start", title)))?;

    let end = record
        .end
        .as_ref()
        .and_then(|t| common::parse_remote_datetime(t.date_time.as_deref(), t.date.as_deref()))
        .map(|t| t.instant)
        .unwrap_or(start.instant);

    Ok(CalendarEvent {
        id: ids.resolve(record.id.as_deref()),
        title,
        start: start.instant,
        end,
        all_day: start.date_only,
        description: record.description.clone().unwrap_or_default(),
        location: record.location.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::reader::read_calendar;
    use crate::models::RemoteEventTime;

    fn wrap(events: &str) -> String {
        format!("BEGIN:VCALENDAR\nVERSION:2.0\n{}END:VCALENDAR\n", events)
    }

    #[test]
    fn test_full_event() {
        let text = wrap(
            "BEGIN:VEVENT\nUID:abc\nSUMMARY:Planning\\, Q2\nDTSTART:20240402T150000Z\nDTEND:20240402T160000Z\nDESCRIPTION:Line one\\nLine two\nLOCATION:Room 4\nEND:VEVENT\n",
        );
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        assert_eq!(out.skipped, 0);
        let event = &out.events[0];
        assert_eq!(event.id, "abc");
        assert_eq!(event.title, "Planning, Q2");
        assert_eq!(event.description, "Line one\nLine two");
        assert_eq!(event.location, "Room 4");
        assert_eq!((event.end - event.start).num_minutes(), 60);
        assert!(!event.all_day);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let text = wrap("BEGIN:VEVENT\nDTSTART:20240402T150000Z\nEND:VEVENT\n");
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        let event = &out.events[0];
        assert_eq!(event.title, UNTITLED_EVENT);
        assert!(!event.id.is_empty());
        assert_eq!(event.description, "");
        assert_eq!(event.location, "");
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn test_blank_summary_gets_placeholder() {
        let text = wrap("BEGIN:VEVENT\nSUMMARY:   \nDTSTART:20240402T150000Z\nEND:VEVENT\n");
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        assert_eq!(out.events[0].title, UNTITLED_EVENT);
    }

    #[test]
    fn test_date_only_is_midnight_to_midnight() {
        let text = wrap("BEGIN:VEVENT\nSUMMARY:Holiday\nDTSTART;VALUE=DATE:20241225\nEND:VEVENT\n");
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        let event = &out.events[0];
        assert!(event.all_day);
        assert_eq!(event.start.to_rfc3339(), "2024-12-25T00:00:00+00:00");
        assert_eq!(event.end.to_rfc3339(), "2024-12-26T00:00:00+00:00");
    }

    #[test]
    fn test_duration_used_when_dtend_missing() {
        let text = wrap("BEGIN:VEVENT\nDTSTART:20240402T150000Z\nDURATION:PT45M\nEND:VEVENT\n");
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        assert_eq!((out.events[0].end - out.events[0].start).num_minutes(), 45);
    }

    #[test]
    fn test_out_of_range_duration_falls_back_to_start() {
        let huge = "1000000W".repeat(14);
        let text = wrap(&format!(
            "BEGIN:VEVENT\nUID:far\nDTSTART:20240101T000000Z\nDURATION:P{}\nEND:VEVENT\n",
            huge
        ));
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        assert_eq!(out.skipped, 0);
        assert_eq!(out.events[0].end, out.events[0].start);

        let parsed = crate::calendar::parse_ics(&text).unwrap();
        assert_eq!(parsed.monthly.total(), 1);
    }

    #[test]
    fn test_end_before_start_is_kept() {
        let text = wrap("BEGIN:VEVENT\nDTSTART:20240402T150000Z\nDTEND:20240401T150000Z\nEND:VEVENT\n");
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        assert!(out.events[0].end < out.events[0].start);
    }

    #[test]
    fn test_missing_start_is_skipped_and_counted() {
        let text = wrap(
            "BEGIN:VEVENT\nSUMMARY:No start\nEND:VEVENT\n\
BEGIN:VEVENT\nSUMMARY:Bad start\nDTSTART:someday\nEND:VEVENT\n\
BEGIN:VEVENT\nSUMMARY:Fine\nDTSTART:20240101T000000Z\nEND:VEVENT\n",
        );
        let tree = read_calendar(&text).unwrap();
        let out = normalize_blocks(&tree);
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.skipped, 2);
        assert_eq!(out.total_records(), tree.events().count());
    }

    #[test]
    fn test_order_preserved_and_duplicate_ids_kept() {
        let text = wrap(
            "BEGIN:VEVENT\nUID:same\nSUMMARY:Later\nDTSTART:20240601T000000Z\nEND:VEVENT\n\
BEGIN:VEVENT\nUID:same\nSUMMARY:Earlier\nDTSTART:20240101T000000Z\nEND:VEVENT\n",
        );
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        let titles: Vec<_> = out.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Later", "Earlier"]);
        assert!(out.events.iter().all(|e| e.id == "same"));
    }

    #[test]
    fn test_generated_ids_are_unique_in_batch() {
        let block = "BEGIN:VEVENT\nDTSTART:20240601T000000Z\nEND:VEVENT\n";
        let text = wrap(&block.repeat(20));
        let out = normalize_blocks(&read_calendar(&text).unwrap());
        let ids: HashSet<_> = out.events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_remote_records() {
        let records = vec![
            RemoteEvent {
                id: Some("g1".to_string()),
                summary: Some("Standup".to_string()),
                start: Some(RemoteEventTime {
                    date_time: Some("2024-05-02T09:30:00+02:00".to_string()),
                    date: None,
                }),
                end: Some(RemoteEventTime {
                    date_time: Some("2024-05-02T09:45:00+02:00".to_string()),
                    date: None,
                }),
                ..RemoteEvent::default()
            },
            RemoteEvent {
                summary: Some("Holiday".to_string()),
                start: Some(RemoteEventTime {
                    date_time: None,
                    date: Some("2024-12-25".to_string()),
                }),
                location: Some("Home".to_string()),
                ..RemoteEvent::default()
            },
            RemoteEvent {
                id: Some("no-start".to_string()),
                summary: Some("Broken".to_string()),
                ..RemoteEvent::default()
            },
        ];

        let out = normalize_remote(&records);
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.skipped, 1);

        let standup = &out.events[0];
        assert_eq!(standup.id, "g1");
        assert_eq!((standup.end - standup.start).num_minutes(), 15);
        assert_eq!(standup.start.to_rfc3339(), "2024-05-02T09:30:00+02:00");

        let holiday = &out.events[1];
        assert!(holiday.all_day);
        assert!(!holiday.id.is_empty());
        assert_eq!(holiday.end, holiday.start);
        assert_eq!(holiday.location, "Home");
        assert_eq!(holiday.description, "");
    }
}
