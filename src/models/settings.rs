// file: src/models/settings.rs
use serde::{Deserialize, Serialize};

/// A4 in PDF points.
pub const A4_SHORT_SIDE: f32 = 595.28;
pub const A4_LONG_SIDE: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn page_size(self) -> (f32, f32) {
        match self {
            Orientation::Landscape => (A4_LONG_SIDE, A4_SHORT_SIDE),
            Orientation::Portrait => (A4_SHORT_SIDE, A4_LONG_SIDE),
        }
    }

    /// (columns, rows)
    pub fn default_grid(self) -> (usize, usize) {
        match self {
            Orientation::Landscape => (4, 3),
            Orientation::Portrait => (3, 4),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "landscape" | "l" => Some(Orientation::Landscape),
            "portrait" | "p" => Some(Orientation::Portrait),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub orientation: Orientation,
    /// Overrides the orientation's default column count.
    pub columns: Option<usize>,
    /// Overrides the orientation's default row count.
    pub rows: Option<usize>,
    /// `None` lays out every event line the cell has room for.
    pub max_events_per_cell: Option<usize>,
    pub title_font_size: f32,
    pub subtitle_font_size: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub notes_font_size: f32,
    pub margin: f32,      // page edge to grid
    pub title_band: f32,  // space above the grid for the document title
    pub gutter: f32,      // between cells
    pub header_height: f32,
    pub cell_padding: f32,
    pub line_spacing: f32, // multiple of font size
    pub section_gap: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            columns: None,
            rows: None,
            max_events_per_cell: Some(3),
            title_font_size: 20.0,
            subtitle_font_size: 8.0,
            header_font_size: 10.0,
            body_font_size: 7.0,
            notes_font_size: 7.0,
            margin: 28.0,
            title_band: 56.0,
            gutter: 14.0,
            header_height: 34.0,
            cell_padding: 6.0,
            line_spacing: 1.2,
            section_gap: 6.0,
        }
    }
}

impl LayoutSettings {
    pub fn columns(&self) -> usize {
        self.columns.unwrap_or_else(|| self.orientation.default_grid().0)
    }

    pub fn rows(&self) -> usize {
        self.rows.unwrap_or_else(|| self.orientation.default_grid().1)
    }

    pub fn cells_per_page(&self) -> usize {
        self.columns() * self.rows()
    }

    pub fn page_size(&self) -> (f32, f32) {
        self.orientation.page_size()
    }
}

/// Remote calendar exchange endpoint (authorization code in, events out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub redirect_uri: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub document_title: String,
    pub layout: LayoutSettings,
    pub exchange: ExchangeSettings,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            document_title: "Editable Yearly Planner".to_string(),
            layout: LayoutSettings::default(),
            exchange: ExchangeSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = PlannerSettings::default();
        assert_eq!(settings.document_title, "Editable Yearly Planner");
        assert_eq!(settings.layout.orientation, Orientation::Landscape);
        assert_eq!(settings.layout.columns(), 4);
        assert_eq!(settings.layout.rows(), 3);
        assert_eq!(settings.layout.max_events_per_cell, Some(3));
        assert_eq!(settings.exchange.timeout_secs, 30);
        assert!(settings.exchange.endpoint.is_none());
    }

    #[test]
    fn test_portrait_grid_and_overrides() {
        let mut layout = LayoutSettings {
            orientation: Orientation::Portrait,
            ..LayoutSettings::default()
        };
        assert_eq!((layout.columns(), layout.rows()), (3, 4));
        assert_eq!(layout.page_size(), (A4_SHORT_SIDE, A4_LONG_SIDE));

        layout.columns = Some(2);
        assert_eq!(layout.cells_per_page(), 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: PlannerSettings =
            serde_json::from_str(r#"{ "layout": { "orientation": "portrait" } }"#).unwrap();
        assert_eq!(settings.layout.orientation, Orientation::Portrait);
        assert_eq!(settings.layout.body_font_size, 7.0);
        assert_eq!(settings.document_title, "Editable Yearly Planner");
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!(Orientation::parse("Landscape"), Some(Orientation::Landscape));
        assert_eq!(Orientation::parse("p"), Some(Orientation::Portrait));
        assert_eq!(Orientation::parse("sideways"), None);
    }
}
