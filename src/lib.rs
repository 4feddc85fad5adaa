// Year Planner library
// Calendar import, month bucketing, edit overlays and printable layout

pub mod calendar;
pub mod config;
pub mod error;
pub mod http_config;
pub mod layout;
pub mod models;
pub mod overlay;
pub mod render;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use calendar::{parse_ics, parse_remote, CalendarExchange, HttpCalendarExchange, ParsedCalendar};
pub use error::{AppResult, LayoutOverflowWarning, PlannerError};
pub use layout::{DocumentHeader, LayoutEngine, LayoutPlan, MonthCell};
pub use models::*;
pub use overlay::{DisplayLine, EditOverlay};
pub use render::{emit_plan, DrawOp, DrawSink, PdfSink, RecordingSink, Theme};
pub use session::{PlannerSession, RenderedDocument};
