//! Document emission.
//!
//! `emit_plan` turns a finished `LayoutPlan` into a flat sequence of drawing
//! primitives. Backends implement `DrawSink`; coordinates stay top-left
//! origin here and each backend converts as it needs to.

pub mod pdf;

use crate::error::AppResult;
use crate::layout::{LayoutPlan, PlacedText, Rect, TextRole};
use serde::Serialize;

pub use pdf::PdfSink;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    BeginPage {
        width: f32,
        height: f32,
    },
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    StrokeRect {
        rect: Rect,
        color: Rgb,
        line_width: f32,
    },
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        color: Rgb,
        bold: bool,
        text: String,
    },
}

pub trait DrawSink {
    fn draw(&mut self, op: DrawOp) -> AppResult<()>;
}

/// Keeps every op in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub ops: Vec<DrawOp>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::BeginPage { .. }))
            .count()
    }
}

impl DrawSink for RecordingSink {
    fn draw(&mut self, op: DrawOp) -> AppResult<()> {
        self.ops.push(op);
        Ok(())
    }
}

/// Pink, purple, green, light blue, yellow; the cycle restarts at June.
const MONTH_ACCENTS: [Rgb; 12] = [
    Rgb::from_u8(220, 20, 140),
    Rgb::from_u8(138, 43, 226),
    Rgb::from_u8(60, 179, 113),
    Rgb::from_u8(70, 130, 180),
    Rgb::from_u8(255, 215, 0),
    Rgb::from_u8(220, 20, 140),
    Rgb::from_u8(220, 20, 140),
    Rgb::from_u8(138, 43, 226),
    Rgb::from_u8(60, 179, 113),
    Rgb::from_u8(70, 130, 180),
    Rgb::from_u8(255, 215, 0),
    Rgb::from_u8(220, 20, 140),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accents: Vec<Rgb>,
    pub text: Rgb,
    pub muted: Rgb,
    pub header_text: Rgb,
    pub border: Rgb,
    pub border_width: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accents: MONTH_ACCENTS.to_vec(),
            text: Rgb::from_u8(33, 33, 33),
            muted: Rgb::from_u8(110, 110, 110),
            header_text: Rgb::from_u8(255, 255, 255),
            border: Rgb::from_u8(200, 200, 200),
            border_width: 0.75,
        }
    }
}

impl Theme {
    pub fn accent_for(&self, index: usize) -> Rgb {
        if self.accents.is_empty() {
            self.text
        } else {
            self.accents[index % self.accents.len()]
        }
    }

    /// Colour and face for a role. The face follows `TextRole::is_bold`, which
    /// is also what the layout measured with.
    fn style(&self, role: TextRole) -> (Rgb, bool) {
        let color = match role {
            TextRole::MonthTitle => self.header_text,
            TextRole::Subtitle | TextRole::Note => self.muted,
            TextRole::DocumentTitle | TextRole::Label | TextRole::Event => self.text,
        };
        (color, role.is_bold())
    }
}

fn text_op(theme: &Theme, placed: &PlacedText) -> DrawOp {
    let (color, bold) = theme.style(placed.role);
    DrawOp::Text {
        x: placed.x,
        y: placed.baseline,
        size: placed.font_size,
        color,
        bold,
        text: placed.text.clone(),
    }
}

/// Walks the plan in page order and hands every primitive to `sink`.
pub fn emit_plan<S: DrawSink + ?Sized>(plan: &LayoutPlan, theme: &Theme, sink: &mut S) -> AppResult<()> {
    for page in &plan.pages {
        sink.draw(DrawOp::BeginPage {
            width: plan.page_width,
            height: plan.page_height,
        })?;

        for placed in page.title.iter().chain(page.subtitle.iter()) {
            sink.draw(text_op(theme, placed))?;
        }

        for cell in &page.cells {
            sink.draw(DrawOp::FillRect {
                rect: cell.header,
                color: theme.accent_for(cell.source_index),
            })?;
            sink.draw(DrawOp::StrokeRect {
                rect: cell.frame,
                color: theme.border,
                line_width: theme.border_width,
            })?;
            sink.draw(text_op(theme, &cell.header_text))?;

            let texts = cell
                .count_line
                .iter()
                .chain(cell.events.label.iter())
                .chain(cell.events.lines.iter())
                .chain(cell.notes.label.iter())
                .chain(cell.notes.lines.iter());
            for placed in texts {
                sink.draw(text_op(theme, placed))?;
            }
        }
    }
    Ok(())
}
