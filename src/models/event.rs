// file: src/models/event.rs
use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

pub const UNTITLED_EVENT: &str = "Untitled Event";

/// A normalized calendar occurrence. Never mutated after import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    /// Advisory only; sources may put it before `start`.
    pub end: DateTime<FixedOffset>,
    pub all_day: bool,
    pub description: String,
    pub location: String,
}

impl CalendarEvent {
    /// Zero-based month of `start`, in the event's own offset.
    pub fn month_index(&self) -> usize {
        self.start.month0() as usize
    }

    pub fn day_of_month(&self) -> u32 {
        self.start.day()
    }

    /// `[05] Team Sync`
    pub fn default_display_text(&self) -> String {
        format!("[{:02}] {}", self.day_of_month(), self.title)
    }

    /// `2024-03-05 09:00 - Team Sync`, or just the date for all-day events.
    pub fn detail_line(&self) -> String {
        if self.all_day {
            format!("{} - {}", self.start.format("%Y-%m-%d"), self.title)
        } else {
            format!("{} - {}", self.start.format("%Y-%m-%d %H:%M"), self.title)
        }
    }
}
