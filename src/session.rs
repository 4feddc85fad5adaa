//! Planner session: the loaded dataset plus the user's edits.
//!
//! All state sits behind one `RwLock`. Imports parse completely before the
//! lock is taken, so a failed import never disturbs what is loaded, and the
//! lock is never held across parsing, layout or I/O.

use crate::calendar::{fetch_remote_events, parse_ics, parse_remote, CalendarExchange, ParsedCalendar};
use crate::error::{AppResult, LayoutOverflowWarning, PlannerError};
use crate::layout::{DocumentHeader, LayoutEngine, LayoutPlan, MonthCell};
use crate::models::{CalendarEvent, ImportSource, ImportSummary, LayoutSettings, MonthlyEvents, MONTHS};
use crate::overlay::{DisplayLine, EditOverlay};
use crate::render::{emit_plan, PdfSink, Theme};
use crate::utils::logging;
use chrono::Month;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Dataset {
    monthly: MonthlyEvents,
    overlay: EditOverlay,
    last_import: Option<ImportSummary>,
}

/// Output of one document generation request.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub warning: Option<LayoutOverflowWarning>,
}

#[derive(Debug, Default)]
pub struct PlannerSession {
    state: RwLock<Dataset>,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports iCalendar text, replacing the current dataset and its edits.
    pub async fn import_ics(&self, text: &str) -> AppResult<ImportSummary> {
        let started = Instant::now();
        let parsed = parse_ics(text.trim_start_matches('\u{feff}')).inspect_err(|e| {
            log::warn!("[Import] Calendar file rejected: {}", e);
        })?;
        Ok(self.install(parsed, ImportSource::IcsFile, started).await)
    }

    pub async fn import_ics_file<P: AsRef<Path>>(&self, path: P) -> AppResult<ImportSummary> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            log::warn!("[Import] Cannot read {}: {}", path.display(), e);
            PlannerError::Read(e)
        })?;
        self.import_ics(&String::from_utf8_lossy(&bytes)).await
    }

    /// Runs one authorization-code exchange and imports what it returns.
    pub async fn import_remote<E: CalendarExchange>(
        &self,
        exchange: &E,
        code: &str,
        timeout: Duration,
    ) -> AppResult<ImportSummary> {
        let started = Instant::now();
        let records = fetch_remote_events(exchange, code, timeout).await?;
        let parsed = parse_remote(&records);
        Ok(self.install(parsed, ImportSource::RemoteService, started).await)
    }

    async fn install(&self, parsed: ParsedCalendar, source: ImportSource, started: Instant) -> ImportSummary {
        let mut state = self.state.write().await;
        let generation = state.overlay.reset();
        let summary = ImportSummary::new(source, generation, parsed.monthly.counts(), parsed.skipped);
        state.monthly = parsed.monthly;
        state.last_import = Some(summary.clone());
        drop(state);

        logging::log_import(
            source,
            summary.imported,
            summary.skipped,
            started.elapsed().as_millis() as u64,
        );
        summary
    }

    /// Drops every event, note and override. Returns the new generation.
    pub async fn clear(&self) -> u64 {
        let mut state = self.state.write().await;
        let generation = state.overlay.reset();
        state.monthly = MonthlyEvents::default();
        state.last_import = None;
        drop(state);

        log::info!("[Import] Cleared all events, notes and edits");
        generation
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.overlay.generation()
    }

    pub async fn last_import(&self) -> Option<ImportSummary> {
        self.state.read().await.last_import.clone()
    }

    pub async fn events(&self, month: Month) -> Vec<CalendarEvent> {
        self.state.read().await.monthly.get(month).to_vec()
    }

    pub async fn set_event_override(
        &self,
        generation: u64,
        month: Month,
        event_id: &str,
        text: &str,
    ) -> AppResult<()> {
        self.state
            .write()
            .await
            .overlay
            .set_event_override(generation, month, event_id, text)
    }

    pub async fn set_month_notes(&self, generation: u64, month: Month, text: &str) -> AppResult<()> {
        self.state
            .write()
            .await
            .overlay
            .set_month_notes(generation, month, text)
    }

    pub async fn notes(&self, month: Month) -> String {
        self.state.read().await.overlay.notes(month).to_string()
    }

    pub async fn display_lines(&self, month: Month) -> Vec<DisplayLine> {
        let state = self.state.read().await;
        state.overlay.resolve_display_lines(month, state.monthly.get(month))
    }

    /// Snapshot of all twelve months, January first.
    pub async fn month_cells(&self) -> Vec<MonthCell> {
        let state = self.state.read().await;
        MONTHS
            .iter()
            .map(|&month| {
                let bucket = state.monthly.get(month);
                MonthCell {
                    title: month.name().to_string(),
                    lines: state
                        .overlay
                        .resolve_display_lines(month, bucket)
                        .into_iter()
                        .map(|line| line.text)
                        .collect(),
                    event_count: bucket.len(),
                    notes: state.overlay.notes(month).to_string(),
                }
            })
            .collect()
    }

    pub async fn plan(&self, settings: &LayoutSettings, header: &DocumentHeader) -> LayoutPlan {
        let cells = self.month_cells().await;
        LayoutEngine::new(settings.clone()).plan(header, &cells)
    }

    pub async fn render_pdf(
        &self,
        settings: &LayoutSettings,
        header: &DocumentHeader,
        theme: &Theme,
    ) -> AppResult<RenderedDocument> {
        let started = Instant::now();
        let plan = self.plan(settings, header).await;

        let mut sink = PdfSink::new();
        emit_plan(&plan, theme, &mut sink)?;
        let bytes = sink.finish()?;

        let warning = plan.overflow_warning();
        if let Some(w) = &warning {
            log::warn!("[Render] {}", w);
        }
        logging::log_render(plan.page_count(), bytes.len(), started.elapsed().as_millis() as u64);

        Ok(RenderedDocument {
            bytes,
            page_count: plan.page_count(),
            warning,
        })
    }

    pub async fn export_pdf<P: AsRef<Path>>(
        &self,
        path: P,
        settings: &LayoutSettings,
        header: &DocumentHeader,
        theme: &Theme,
    ) -> AppResult<RenderedDocument> {
        let document = self.render_pdf(settings, header, theme).await?;
        tokio::fs::write(path.as_ref(), &document.bytes).await?;
        log::info!(
            "[Render] Wrote {} ({} bytes)",
            path.as_ref().display(),
            document.bytes.len()
        );
        Ok(document)
    }
}
