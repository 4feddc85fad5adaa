//! Fixed-grid page layout for the yearly overview.
//!
//! `LayoutEngine::plan` is a pure function of its inputs: month cells are
//! placed row-major into a `columns × rows` grid per page, and each cell's
//! text is wrapped and truncated to fit. Nothing here draws; the emitter in
//! `render` consumes the resulting `LayoutPlan`.

pub mod text;

use crate::error::{LayoutOverflowWarning, TruncatedMonth};
use crate::models::LayoutSettings;
use serde::Serialize;
use text::{fit_rows, wrap_text, HelveticaMetrics, TextMeasurer, ELLIPSIS};

/// What the caller wants laid out for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCell {
    pub title: String,
    pub lines: Vec<String>,
    /// Total events in the month; may exceed `lines.len()` when the caller
    /// already shortened the list.
    pub event_count: usize,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentHeader {
    pub title: String,
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextRole {
    DocumentTitle,
    Subtitle,
    MonthTitle,
    Label,
    Event,
    Note,
}

impl TextRole {
    /// Roles set in the bold face; measured and drawn the same way.
    pub fn is_bold(self) -> bool {
        matches!(self, TextRole::DocumentTitle | TextRole::MonthTitle | TextRole::Label)
    }
}

/// A single line of text; `baseline` is measured from the top of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub font_size: f32,
    pub role: TextRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionLayout {
    pub label: Option<PlacedText>,
    pub lines: Vec<PlacedText>,
    /// Source lines (display lines, or lines of the notes text) that are not
    /// fully visible. A line cut after its first wrapped row counts once.
    pub truncated_lines: usize,
}

/// Source lines with at least one row at or past `kept`.
fn lines_cut(origins: &[usize], kept: usize, line_count: usize) -> usize {
    origins
        .get(kept)
        .map_or(0, |&first| line_count.saturating_sub(first))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedCell {
    /// Position of the cell in the input slice.
    pub source_index: usize,
    pub title: String,
    pub frame: Rect,
    pub header: Rect,
    pub header_text: PlacedText,
    pub count_line: Option<PlacedText>,
    pub events: SectionLayout,
    pub notes: SectionLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedPage {
    pub number: usize,
    pub title: Option<PlacedText>,
    pub subtitle: Option<PlacedText>,
    pub cells: Vec<PlacedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<PlannedPage>,
}

impl LayoutPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &PlacedCell> + '_ {
        self.pages.iter().flat_map(|p| p.cells.iter())
    }

    /// `None` when every cell showed all of its content.
    pub fn overflow_warning(&self) -> Option<LayoutOverflowWarning> {
        let months: Vec<TruncatedMonth> = self
            .cells()
            .filter(|c| c.events.truncated_lines > 0 || c.notes.truncated_lines > 0)
            .map(|c| TruncatedMonth {
                title: c.title.clone(),
                event_lines: c.events.truncated_lines,
                note_lines: c.notes.truncated_lines,
            })
            .collect();
        if months.is_empty() {
            None
        } else {
            Some(LayoutOverflowWarning { months })
        }
    }
}

pub struct LayoutEngine<M: TextMeasurer = HelveticaMetrics> {
    settings: LayoutSettings,
    measurer: M,
}

impl LayoutEngine<HelveticaMetrics> {
    pub fn new(settings: LayoutSettings) -> Self {
        Self::with_measurer(settings, HelveticaMetrics)
    }
}

impl<M: TextMeasurer> LayoutEngine<M> {
    pub fn with_measurer(settings: LayoutSettings, measurer: M) -> Self {
        Self { settings, measurer }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn plan(&self, header: &DocumentHeader, cells: &[MonthCell]) -> LayoutPlan {
        let s = &self.settings;
        let (page_width, page_height) = s.page_size();
        let columns = s.columns().max(1);
        let rows = s.rows().max(1);
        let per_page = columns * rows;

        let grid_top = s.margin + s.title_band;
        let grid_width = (page_width - 2.0 * s.margin).max(0.0);
        let grid_height = (page_height - grid_top - s.margin).max(0.0);
        let cell_width = ((grid_width - (columns - 1) as f32 * s.gutter) / columns as f32).max(0.0);
        let cell_height = ((grid_height - (rows - 1) as f32 * s.gutter) / rows as f32).max(0.0);

        let page_count = cells.len().div_ceil(per_page).max(1);
        let mut pages = Vec::with_capacity(page_count);

        for page_idx in 0..page_count {
            let (title, subtitle) = self.place_document_header(header, page_width);
            let start = page_idx * per_page;
            let end = (start + per_page).min(cells.len());

            let placed = cells[start..end]
                .iter()
                .enumerate()
                .map(|(slot, cell)| {
                    let col = slot % columns;
                    let row = slot / columns;
                    let frame = Rect {
                        x: s.margin + col as f32 * (cell_width + s.gutter),
                        y: grid_top + row as f32 * (cell_height + s.gutter),
                        width: cell_width,
                        height: cell_height,
                    };
                    self.layout_cell(start + slot, cell, frame)
                })
                .collect();

            pages.push(PlannedPage {
                number: page_idx + 1,
                title,
                subtitle,
                cells: placed,
            });
        }

        LayoutPlan {
            page_width,
            page_height,
            pages,
        }
    }

    fn measure(&self, text: &str, font_size: f32, role: TextRole) -> f32 {
        if role.is_bold() {
            self.measurer.bold_text_width(text, font_size)
        } else {
            self.measurer.text_width(text, font_size)
        }
    }

    fn centered(&self, text: &str, font_size: f32, role: TextRole, left: f32, width: f32) -> f32 {
        let w = self.measure(text, font_size, role);
        left + ((width - w) / 2.0).max(0.0)
    }

    /// Wraps each source line on its own and records which line every row came from.
    fn wrap_lines<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
        width: f32,
        font_size: f32,
    ) -> (Vec<String>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut origins = Vec::new();
        for (index, line) in lines.enumerate() {
            let mut wrapped = wrap_text(line, width, font_size, &self.measurer);
            if wrapped.is_empty() {
                wrapped.push(String::new());
            }
            origins.extend(std::iter::repeat(index).take(wrapped.len()));
            rows.extend(wrapped);
        }
        (rows, origins)
    }

    fn place_document_header(
        &self,
        header: &DocumentHeader,
        page_width: f32,
    ) -> (Option<PlacedText>, Option<PlacedText>) {
        let s = &self.settings;
        let title = Some(header.title.trim())
            .filter(|t| !t.is_empty())
            .map(|t| PlacedText {
                text: t.to_string(),
                x: self.centered(t, s.title_font_size, TextRole::DocumentTitle, 0.0, page_width),
                baseline: s.margin + s.title_font_size,
                font_size: s.title_font_size,
                role: TextRole::DocumentTitle,
            });
        let subtitle = header
            .subtitle
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| PlacedText {
                text: t.to_string(),
                x: self.centered(t, s.subtitle_font_size, TextRole::Subtitle, 0.0, page_width),
                baseline: s.margin + s.title_font_size + s.subtitle_font_size * 1.8,
                font_size: s.subtitle_font_size,
                role: TextRole::Subtitle,
            });
        (title, subtitle)
    }

    fn layout_cell(&self, source_index: usize, cell: &MonthCell, frame: Rect) -> PlacedCell {
        let s = &self.settings;
        let body_lh = s.body_font_size * s.line_spacing;
        let notes_lh = s.notes_font_size * s.line_spacing;

        let header = Rect {
            height: s.header_height.min(frame.height),
            ..frame
        };
        let inner_x = frame.x + s.cell_padding;
        let inner_w = (frame.width - 2.0 * s.cell_padding).max(0.0);
        let content_top = frame.y + header.height + s.cell_padding;
        let content_bottom = frame.y + frame.height - s.cell_padding;
        let mut avail = (content_bottom - content_top).max(0.0);
        let mut cursor = content_top;

        // Event rows: capped preview plus a summary of what the cap hid.
        let shown = match s.max_events_per_cell {
            Some(cap) => cell.lines.len().min(cap),
            None => cell.lines.len(),
        };
        let hidden = cell.event_count.max(cell.lines.len()).saturating_sub(shown);
        let (mut event_rows, event_origins) = self.wrap_lines(
            cell.lines[..shown].iter().map(String::as_str),
            inner_w,
            s.body_font_size,
        );
        if hidden > 0 {
            event_rows.push(format!("+{} more{}", hidden, ELLIPSIS));
        }

        let note_lines: Vec<&str> = match cell.notes.trim() {
            "" => Vec::new(),
            notes => notes.lines().collect(),
        };
        let (note_rows, note_origins) =
            self.wrap_lines(note_lines.iter().copied(), inner_w, s.notes_font_size);

        let count = cell.event_count.max(cell.lines.len());
        let mut title_text = cell.title.clone();
        let mut count_line = None;

        if count > 0 {
            let label = format!("Events ({}):", count);
            if avail >= body_lh {
                count_line = Some(PlacedText {
                    text: label,
                    x: inner_x,
                    baseline: cursor + s.body_font_size,
                    font_size: s.body_font_size,
                    role: TextRole::Label,
                });
                cursor += body_lh;
                avail -= body_lh;
            } else {
                // No room for anything below the header: keep the count visible there.
                title_text = format!("{} ({})", cell.title, count);
                avail = 0.0;
            }
        }

        let header_text = PlacedText {
            x: self.centered(
                &title_text,
                s.header_font_size,
                TextRole::MonthTitle,
                frame.x,
                frame.width,
            ),
            baseline: frame.y + (header.height + s.header_font_size * 0.7) / 2.0,
            text: title_text,
            font_size: s.header_font_size,
            role: TextRole::MonthTitle,
        };

        let (event_budget, note_budget) =
            self.split_rows(avail, event_rows.len(), note_rows.len(), body_lh, notes_lh);

        // Events section
        let (event_rows, _) =
            fit_rows(event_rows, event_budget, inner_w, s.body_font_size, &self.measurer);
        let events_cut = lines_cut(&event_origins, event_rows.len(), shown);
        let events = SectionLayout {
            label: None,
            lines: event_rows
                .into_iter()
                .enumerate()
                .map(|(i, text)| PlacedText {
                    text,
                    x: inner_x,
                    baseline: cursor + i as f32 * body_lh + s.body_font_size,
                    font_size: s.body_font_size,
                    role: TextRole::Event,
                })
                .collect(),
            // The summary row stands for `hidden` lines whether or not it is shown.
            truncated_lines: events_cut + hidden,
        };
        cursor += events.lines.len() as f32 * body_lh;

        // Notes section: label row + wrapped notes
        let notes = if note_rows.is_empty() {
            SectionLayout::default()
        } else if note_budget < 2 {
            SectionLayout {
                label: None,
                lines: Vec::new(),
                truncated_lines: note_lines.len(),
            }
        } else {
            if !events.lines.is_empty() {
                cursor += s.section_gap;
            }
            let label = PlacedText {
                text: "Notes:".to_string(),
                x: inner_x,
                baseline: cursor + s.notes_font_size,
                font_size: s.notes_font_size,
                role: TextRole::Label,
            };
            cursor += notes_lh;
            let (rows, _) = fit_rows(
                note_rows,
                note_budget - 1,
                inner_w,
                s.notes_font_size,
                &self.measurer,
            );
            let notes_cut = lines_cut(&note_origins, rows.len(), note_lines.len());
            SectionLayout {
                label: Some(label),
                lines: rows
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| PlacedText {
                        text,
                        x: inner_x,
                        baseline: cursor + i as f32 * notes_lh + s.notes_font_size,
                        font_size: s.notes_font_size,
                        role: TextRole::Note,
                    })
                    .collect(),
                truncated_lines: notes_cut,
            }
        };

        PlacedCell {
            source_index,
            title: cell.title.clone(),
            frame,
            header,
            header_text,
            count_line,
            events,
            notes,
        }
    }

    /// Row budgets for (events, notes incl. its label) within `avail`.
    fn split_rows(
        &self,
        avail: f32,
        event_rows: usize,
        note_rows: usize,
        body_lh: f32,
        notes_lh: f32,
    ) -> (usize, usize) {
        let rows_in = |height: f32, lh: f32| -> usize {
            if lh <= 0.0 || height <= 0.0 {
                0
            } else {
                // Small epsilon so exact fits are not lost to float error.
                ((height + 1e-3) / lh).floor() as usize
            }
        };

        let note_rows = if note_rows > 0 { note_rows + 1 } else { 0 };
        if note_rows == 0 {
            return (rows_in(avail, body_lh), 0);
        }
        if event_rows == 0 {
            return (0, rows_in(avail, notes_lh));
        }

        let gap = self.settings.section_gap;
        let event_demand = event_rows as f32 * body_lh;
        let note_demand = note_rows as f32 * notes_lh;
        if event_demand + gap + note_demand <= avail + 1e-3 {
            return (event_rows, note_rows);
        }

        let usable = (avail - gap).max(0.0);
        if usable + 1e-3 < body_lh + 2.0 * notes_lh {
            // No room for both sections; events win.
            return (rows_in(avail, body_lh), 0);
        }

        let event_share = usable * event_demand / (event_demand + note_demand);
        let event_budget = rows_in(event_share, body_lh).max(1);
        let note_budget = rows_in(usable - event_budget as f32 * body_lh, notes_lh);

        // Label plus one row is the least worth drawing.
        if note_budget < 2 {
            (rows_in(avail, body_lh), 0)
        } else {
            (event_budget, note_budget)
        }
    }
}
