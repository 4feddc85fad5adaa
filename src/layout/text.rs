// Text measurement, greedy word wrap and ellipsis truncation.

pub const ELLIPSIS: char = '\u{2026}';

/// Width of a run of text at a given font size, in document units.
pub trait TextMeasurer {
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Same run in the bold face. Defaults to the regular width.
    fn bold_text_width(&self, text: &str, font_size: f32) -> f32 {
        self.text_width(text, font_size)
    }
}

/// Helvetica advance widths (per 1000 em) for printable ASCII.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for printable ASCII.
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Fixed metrics for the standard Helvetica faces used by the PDF backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    fn advance(table: &[u16; 95], c: char) -> u16 {
        match c {
            ' '..='~' => table[c as usize - 32],
            ELLIPSIS => 1000,
            _ => 556,
        }
    }

    fn width(table: &[u16; 95], text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| Self::advance(table, c) as u32).sum();
        units as f32 * font_size / 1000.0
    }
}

impl TextMeasurer for HelveticaMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        Self::width(&HELVETICA_ASCII, text, font_size)
    }

    fn bold_text_width(&self, text: &str, font_size: f32) -> f32 {
        Self::width(&HELVETICA_BOLD_ASCII, text, font_size)
    }
}

/// Greedy word wrap. Explicit newlines always break; blank lines are kept
/// as empty rows. A token wider than `max_width` is split by characters.
pub fn wrap_text<M: TextMeasurer + ?Sized>(
    text: &str,
    max_width: f32,
    font_size: f32,
    measurer: &M,
) -> Vec<String> {
    let mut rows = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measurer.text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            if measurer.text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = hard_wrap(word, max_width, font_size, measurer);
                current = pieces.pop().unwrap_or_default();
                rows.extend(pieces);
            }
        }

        rows.push(current);
    }

    rows
}

fn hard_wrap<M: TextMeasurer + ?Sized>(
    word: &str,
    max_width: f32,
    font_size: f32,
    measurer: &M,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        // Always keep at least one char per row so narrow cells still progress.
        if current.chars().count() > 1 && measurer.text_width(&current, font_size) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Shortens `row` until `row…` fits in `max_width`.
pub fn with_ellipsis<M: TextMeasurer + ?Sized>(
    row: &str,
    max_width: f32,
    font_size: f32,
    measurer: &M,
) -> String {
    let mut base: String = row.trim_end().to_string();
    loop {
        let candidate = format!("{}{}", base, ELLIPSIS);
        if base.is_empty() || measurer.text_width(&candidate, font_size) <= max_width {
            return candidate;
        }
        base.pop();
        base = base.trim_end().to_string();
    }
}

/// Keeps at most `budget` rows. When rows are dropped the last kept row is
/// marked with an ellipsis. Returns the kept rows and how many were dropped.
pub fn fit_rows<M: TextMeasurer + ?Sized>(
    mut rows: Vec<String>,
    budget: usize,
    max_width: f32,
    font_size: f32,
    measurer: &M,
) -> (Vec<String>, usize) {
    if rows.len() <= budget {
        return (rows, 0);
    }
    let dropped = rows.len() - budget;
    rows.truncate(budget);
    if let Some(last) = rows.last_mut() {
        *last = with_ellipsis(last, max_width, font_size, measurer);
    }
    (rows, dropped)
}
