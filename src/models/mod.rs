// file: src/models/mod.rs

pub mod event;
pub mod import;
pub mod month;
pub mod remote;
pub mod settings;

// Flatten so callers can write `use crate::models::CalendarEvent`.
pub use event::{CalendarEvent, UNTITLED_EVENT};
pub use import::{ImportSource, ImportSummary};
pub use month::{month_from_index, month_index, parse_month_name, MonthlyEvents, MONTHS};
pub use remote::{RemoteEvent, RemoteEventTime};
pub use settings::{ExchangeSettings, LayoutSettings, Orientation, PlannerSettings};
