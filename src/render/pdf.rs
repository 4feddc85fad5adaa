// PDF backend on top of pdf-writer.
// Uses the built-in Helvetica faces with WinAnsi encoding, so nothing is
// embedded and identical op sequences give identical bytes.

use super::{DrawOp, DrawSink, Rgb};
use crate::error::{AppResult, PlannerError};
use crate::layout::Rect;
use pdf_writer::{Content, Name, Pdf, Rect as PdfRect, Ref, Str};

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

struct OpenPage {
    width: f32,
    height: f32,
    content: Content,
}

pub struct PdfSink {
    pdf: Pdf,
    catalog_id: Ref,
    tree_id: Ref,
    regular_id: Ref,
    bold_id: Ref,
    next_id: i32,
    page_ids: Vec<Ref>,
    current: Option<OpenPage>,
}

impl Default for PdfSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfSink {
    pub fn new() -> Self {
        Self {
            pdf: Pdf::new(),
            catalog_id: Ref::new(1),
            tree_id: Ref::new(2),
            regular_id: Ref::new(3),
            bold_id: Ref::new(4),
            next_id: 5,
            page_ids: Vec::new(),
            current: None,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn page_mut(&mut self) -> AppResult<&mut OpenPage> {
        self.current
            .as_mut()
            .ok_or_else(|| PlannerError::render("draw operation before the first page"))
    }

    fn flush_page(&mut self) {
        let Some(page) = self.current.take() else {
            return;
        };
        let page_id = self.alloc();
        let content_id = self.alloc();

        let data = page.content.finish();
        self.pdf.stream(content_id, &data);

        {
            let mut writer = self.pdf.page(page_id);
            writer
                .media_box(PdfRect::new(0.0, 0.0, page.width, page.height))
                .parent(self.tree_id)
                .contents(content_id);
            writer
                .resources()
                .fonts()
                .pair(REGULAR_FONT, self.regular_id)
                .pair(BOLD_FONT, self.bold_id);
        }

        self.page_ids.push(page_id);
    }

    /// Closes the document and returns the file bytes.
    pub fn finish(mut self) -> AppResult<Vec<u8>> {
        self.flush_page();
        if self.page_ids.is_empty() {
            return Err(PlannerError::render("document has no pages"));
        }

        self.pdf.catalog(self.catalog_id).pages(self.tree_id);
        self.pdf
            .pages(self.tree_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf
            .type1_font(self.regular_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        self.pdf
            .type1_font(self.bold_id)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        log::debug!("PDF finished with {} pages", self.page_ids.len());
        Ok(self.pdf.finish())
    }
}

/// Converts a top-left rect to PDF's bottom-left space.
fn flip(rect: &Rect, page_height: f32) -> (f32, f32, f32, f32) {
    (rect.x, page_height - rect.y - rect.height, rect.width, rect.height)
}

impl DrawSink for PdfSink {
    fn draw(&mut self, op: DrawOp) -> AppResult<()> {
        match op {
            DrawOp::BeginPage { width, height } => {
                self.flush_page();
                self.current = Some(OpenPage {
                    width,
                    height,
                    content: Content::new(),
                });
            }
            DrawOp::FillRect { rect, color } => {
                let page = self.page_mut()?;
                let (x, y, w, h) = flip(&rect, page.height);
                let Rgb { r, g, b } = color;
                page.content
                    .save_state()
                    .set_fill_rgb(r, g, b)
                    .rect(x, y, w, h)
                    .fill_nonzero()
                    .restore_state();
            }
            DrawOp::StrokeRect {
                rect,
                color,
                line_width,
            } => {
                let page = self.page_mut()?;
                let (x, y, w, h) = flip(&rect, page.height);
                let Rgb { r, g, b } = color;
                page.content
                    .save_state()
                    .set_stroke_rgb(r, g, b)
                    .set_line_width(line_width)
                    .rect(x, y, w, h)
                    .stroke()
                    .restore_state();
            }
            DrawOp::Text {
                x,
                y,
                size,
                color,
                bold,
                text,
            } => {
                let page = self.page_mut()?;
                let baseline = page.height - y;
                let bytes = to_winansi(&text);
                let font = if bold { BOLD_FONT } else { REGULAR_FONT };
                let Rgb { r, g, b } = color;
                page.content
                    .save_state()
                    .set_fill_rgb(r, g, b)
                    .begin_text()
                    .set_font(font, size)
                    .next_line(x, baseline)
                    .show(Str(&bytes))
                    .end_text()
                    .restore_state();
            }
        }
        Ok(())
    }
}

/// Maps text to WinAnsi bytes. Characters outside the encoding become '?'.
pub fn to_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2026}' => 0x85,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{20AC}' => 0x80,
            '\t' => b' ',
            c if (' '..='~').contains(&c) => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{emit_plan, Theme};
    use crate::layout::{DocumentHeader, LayoutEngine, MonthCell};
    use crate::models::LayoutSettings;

    fn sample_pdf() -> Vec<u8> {
        let cells: Vec<MonthCell> = ["January", "February", "March"]
            .iter()
            .map(|m| MonthCell {
                title: m.to_string(),
                lines: vec!["[05] Team Sync".to_string()],
                event_count: 1,
                notes: "Café budget review…".to_string(),
            })
            .collect();
        let header = DocumentHeader {
            title: "Editable Yearly Planner".to_string(),
            subtitle: Some("Generated on 2024-01-01".to_string()),
        };
        let plan = LayoutEngine::new(LayoutSettings::default()).plan(&header, &cells);
        let mut sink = PdfSink::new();
        emit_plan(&plan, &Theme::default(), &mut sink).unwrap();
        sink.finish().unwrap()
    }

    #[test]
    fn test_pdf_structure() {
        let bytes = sample_pdf();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("(Team Sync)") || text.contains("Team Sync"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_pdf_is_deterministic() {
        assert_eq!(sample_pdf(), sample_pdf());
    }

    #[test]
    fn test_draw_before_page_fails() {
        let mut sink = PdfSink::new();
        let result = sink.draw(DrawOp::FillRect {
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            color: Rgb::from_u8(0, 0, 0),
        });
        assert!(matches!(result, Err(PlannerError::Render(_))));
        assert!(PdfSink::new().finish().is_err());
    }

    #[test]
    fn test_winansi_mapping() {
        assert_eq!(to_winansi("abc"), b"abc".to_vec());
        assert_eq!(to_winansi("é…"), vec![0xE9, 0x85]);
        assert_eq!(to_winansi("日"), vec![b'?']);
    }

    #[test]
    fn test_flip_to_bottom_left() {
        let rect = Rect {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(flip(&rect, 100.0), (10.0, 40.0, 30.0, 40.0));
    }
}
