use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Could not read input: {0}")]
    Read(#[source] std::io::Error),

    #[error("Malformed calendar data at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("Event has no usable start date: {0}")]
    UnresolvedDate(String),

    #[error("Calendar service error: {0}")]
    RemoteFetch(String),

    #[error("Edit rejected: dataset generation {found} is stale (current is {expected})")]
    StaleGeneration { expected: u64, found: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub fn format<S: Into<String>>(line: usize, msg: S) -> Self {
        Self::Format {
            line,
            message: msg.into(),
        }
    }

    pub fn unresolved_date<S: Into<String>>(msg: S) -> Self {
        Self::UnresolvedDate(msg.into())
    }

    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Self::RemoteFetch(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn render<S: Into<String>>(msg: S) -> Self {
        Self::Render(msg.into())
    }

    /// True for failures that abort an import and leave the loaded dataset as it was.
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self,
            Self::Read(_) | Self::Format { .. } | Self::RemoteFetch(_) | Self::Network(_)
        )
    }

    /// One clear sentence for the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::Read(e) => format!("Could not read the file: {}", e),
            Self::Format { line, message } => format!(
                "Could not understand the file (line {}): {}",
                line, message
            ),
            Self::RemoteFetch(msg) => {
                format!("Could not reach the calendar service: {}", msg)
            }
            Self::Network(_) => "Could not reach the calendar service.".to_string(),
            Self::StaleGeneration { .. } => {
                "This edit belongs to a calendar that has since been replaced.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, PlannerError>;

/// Non-fatal signal that some month cells could not show all of their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOverflowWarning {
    pub months: Vec<TruncatedMonth>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedMonth {
    pub title: String,
    /// Event display lines not fully shown, including those behind the preview cap.
    pub event_lines: usize,
    /// Lines of the notes text not fully shown.
    pub note_lines: usize,
}

impl LayoutOverflowWarning {
    pub fn total_lines(&self) -> usize {
        self.months
            .iter()
            .map(|m| m.event_lines + m.note_lines)
            .sum()
    }
}

impl fmt::Display for LayoutOverflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Some content did not fit:")?;
        for month in &self.months {
            write!(
                f,
                " {} ({} event lines, {} note lines cut);",
                month.title, month.event_lines, month.note_lines
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_distinguish_failures() {
        let read = PlannerError::Read(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let format = PlannerError::format(7, "END:VEVENT without BEGIN");
        let remote = PlannerError::remote("timed out after 5s");

        assert!(read.user_message().starts_with("Could not read the file"));
        assert!(format.user_message().starts_with("Could not understand the file (line 7)"));
        assert!(remote.user_message().starts_with("Could not reach the calendar service"));
    }

    #[test]
    fn test_import_failure_classification() {
        assert!(PlannerError::format(1, "x").is_import_failure());
        assert!(PlannerError::remote("x").is_import_failure());
        assert!(!PlannerError::invalid_input("x").is_import_failure());
        assert!(!PlannerError::StaleGeneration { expected: 2, found: 1 }.is_import_failure());
    }

    #[test]
    fn test_overflow_warning_totals() {
        let warning = LayoutOverflowWarning {
            months: vec![
                TruncatedMonth { title: "March".to_string(), event_lines: 2, note_lines: 1 },
                TruncatedMonth { title: "June".to_string(), event_lines: 0, note_lines: 4 },
            ],
        };
        assert_eq!(warning.total_lines(), 7);
        assert!(warning.to_string().contains("March (2 event lines, 1 note lines cut)"));
    }
}
