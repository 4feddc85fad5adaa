//! User edits layered over imported events.
//!
//! Overrides and notes are keyed by month and event id and never touch the
//! events themselves. Every write carries the dataset generation it was made
//! against; `reset` bumps the generation so edits aimed at a replaced
//! dataset are refused instead of leaking into the new one.

use crate::error::{AppResult, PlannerError};
use crate::models::{month_index, CalendarEvent};
use chrono::Month;
use serde::Serialize;
use std::collections::BTreeMap;

/// One line of a month's event list as it will be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub event_id: String,
    pub text: String,
    pub overridden: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EditOverlay {
    generation: u64,
    overrides: [BTreeMap<String, String>; 12],
    notes: [String; 12],
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn check_generation(&self, generation: u64) -> AppResult<()> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(PlannerError::StaleGeneration {
                expected: self.generation,
                found: generation,
            })
        }
    }

    /// Upserts the display text for one event. Empty text removes the override.
    pub fn set_event_override(
        &mut self,
        generation: u64,
        month: Month,
        event_id: &str,
        text: &str,
    ) -> AppResult<()> {
        self.check_generation(generation)?;
        let overrides = &mut self.overrides[month_index(month)];
        if text.is_empty() {
            overrides.remove(event_id);
        } else {
            overrides.insert(event_id.to_string(), text.to_string());
        }
        Ok(())
    }

    pub fn set_month_notes(&mut self, generation: u64, month: Month, text: &str) -> AppResult<()> {
        self.check_generation(generation)?;
        self.notes[month_index(month)] = text.to_string();
        Ok(())
    }

    pub fn event_override(&self, month: Month, event_id: &str) -> Option<&str> {
        self.overrides[month_index(month)]
            .get(event_id)
            .map(String::as_str)
    }

    pub fn notes(&self, month: Month) -> &str {
        &self.notes[month_index(month)]
    }

    pub fn override_count(&self) -> usize {
        self.overrides.iter().map(BTreeMap::len).sum()
    }

    /// Override text where present, else `[DD] Title`, in bucket order.
    pub fn resolve_display_lines(&self, month: Month, bucket: &[CalendarEvent]) -> Vec<DisplayLine> {
        let overrides = &self.overrides[month_index(month)];
        bucket
            .iter()
            .map(|event| match overrides.get(&event.id) {
                Some(text) => DisplayLine {
                    event_id: event.id.clone(),
                    text: text.clone(),
                    overridden: true,
                },
                None => DisplayLine {
                    event_id: event.id.clone(),
                    text: event.default_display_text(),
                    overridden: false,
                },
            })
            .collect()
    }

    /// Drops every override and note and starts a new generation.
    pub fn reset(&mut self) -> u64 {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
        generation
    }
}
