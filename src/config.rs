//! Configuration loading and validation
//!
//! Settings come from a JSON file (explicit path, else the per-user config
//! directory, else built-in defaults), then environment overrides, then
//! validation.

use crate::error::{AppResult, PlannerError};
use crate::models::{Orientation, PlannerSettings};
use log::{debug, info};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_ORIENTATION: &str = "YEARPLANNER_ORIENTATION";
pub const ENV_EVENTS_PER_CELL: &str = "YEARPLANNER_EVENTS_PER_CELL";
pub const ENV_EXCHANGE_URL: &str = "YEARPLANNER_EXCHANGE_URL";
pub const ENV_API_KEY: &str = "YEARPLANNER_API_KEY";

/// `<config dir>/yearplanner/settings.json`, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("yearplanner").join("settings.json"))
}

/// Loads, overrides and validates settings.
///
/// An explicit `path` must exist. The default location is only read when a
/// file is present there.
pub fn load_settings(path: Option<&Path>) -> AppResult<PlannerSettings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => match default_settings_path().filter(|p| p.is_file()) {
            Some(path) => read_settings_file(&path)?,
            None => {
                debug!("No settings file found, using defaults");
                PlannerSettings::default()
            }
        },
    };

    apply_env_overrides(&mut settings)?;
    validate_config(&settings)?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> AppResult<PlannerSettings> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PlannerError::config(format!("cannot read settings file {}: {}", path.display(), e))
    })?;
    let settings = serde_json::from_str(&raw).map_err(|e| {
        PlannerError::config(format!("invalid settings file {}: {}", path.display(), e))
    })?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn apply_env_overrides(settings: &mut PlannerSettings) -> AppResult<()> {
    if let Some(value) = env_value(ENV_ORIENTATION) {
        settings.layout.orientation = Orientation::parse(&value).ok_or_else(|| {
            PlannerError::config(format!("{} must be 'landscape' or 'portrait', got '{}'", ENV_ORIENTATION, value))
        })?;
    }

    if let Some(value) = env_value(ENV_EVENTS_PER_CELL) {
        settings.layout.max_events_per_cell = match value.to_lowercase().as_str() {
            "all" | "unlimited" => None,
            n => Some(n.parse().map_err(|_| {
                PlannerError::config(format!("{} must be a number or 'all', got '{}'", ENV_EVENTS_PER_CELL, value))
            })?),
        };
    }

    if let Some(value) = env_value(ENV_EXCHANGE_URL) {
        settings.exchange.endpoint = Some(value);
    }
    if let Some(value) = env_value(ENV_API_KEY) {
        settings.exchange.api_key = Some(value);
    }
    Ok(())
}

/// Rejects settings that cannot produce a usable page.
pub fn validate_config(settings: &PlannerSettings) -> AppResult<()> {
    let layout = &settings.layout;

    if layout.columns() == 0 || layout.rows() == 0 {
        return Err(PlannerError::config("grid needs at least one column and one row"));
    }

    let fonts = [
        ("title_font_size", layout.title_font_size),
        ("subtitle_font_size", layout.subtitle_font_size),
        ("header_font_size", layout.header_font_size),
        ("body_font_size", layout.body_font_size),
        ("notes_font_size", layout.notes_font_size),
    ];
    for (name, size) in fonts {
        if !(size.is_finite() && size > 0.0) {
            return Err(PlannerError::config(format!("{} must be positive", name)));
        }
    }

    let spacing = [
        ("margin", layout.margin),
        ("title_band", layout.title_band),
        ("gutter", layout.gutter),
        ("header_height", layout.header_height),
        ("cell_padding", layout.cell_padding),
        ("section_gap", layout.section_gap),
    ];
    for (name, value) in spacing {
        if !(value.is_finite() && value >= 0.0) {
            return Err(PlannerError::config(format!("{} must not be negative", name)));
        }
    }
    if !(layout.line_spacing.is_finite() && layout.line_spacing >= 1.0) {
        return Err(PlannerError::config("line_spacing must be at least 1.0"));
    }

    let (width, height) = layout.page_size();
    let grid_width = width - 2.0 * layout.margin - (layout.columns() - 1) as f32 * layout.gutter;
    let grid_height = height
        - 2.0 * layout.margin
        - layout.title_band
        - (layout.rows() - 1) as f32 * layout.gutter;
    if grid_width <= 0.0 || grid_height <= 0.0 {
        return Err(PlannerError::config("margins and gutters leave no room for the grid"));
    }

    if let Some(endpoint) = &settings.exchange.endpoint {
        let url = Url::parse(endpoint)
            .map_err(|e| PlannerError::config(format!("invalid exchange endpoint '{}': {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PlannerError::config(format!(
                "exchange endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }
    }
    if settings.exchange.timeout_secs == 0 {
        return Err(PlannerError::config("exchange timeout must be at least one second"));
    }

    info!(
        "Configuration valid ({:?}, {}x{} grid)",
        layout.orientation,
        layout.columns(),
        layout.rows()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        for name in [ENV_ORIENTATION, ENV_EVENTS_PER_CELL, ENV_EXCHANGE_URL, ENV_API_KEY] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&PlannerSettings::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_layout() {
        let mut settings = PlannerSettings::default();
        settings.layout.columns = Some(0);
        assert!(matches!(validate_config(&settings), Err(PlannerError::Config(_))));

        let mut settings = PlannerSettings::default();
        settings.layout.body_font_size = 0.0;
        assert!(validate_config(&settings).is_err());

        let mut settings = PlannerSettings::default();
        settings.layout.margin = 400.0;
        assert!(validate_config(&settings).is_err());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let mut settings = PlannerSettings::default();
        settings.exchange.endpoint = Some("ftp://example.com/exchange".to_string());
        assert!(validate_config(&settings).is_err());

        settings.exchange.endpoint = Some("https://example.com/exchange".to_string());
        assert!(validate_config(&settings).is_ok());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "document_title": "Family Planner", "layout": {{ "orientation": "portrait", "max_events_per_cell": null }} }}"#
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.document_title, "Family Planner");
        assert_eq!(settings.layout.orientation, Orientation::Portrait);
        assert_eq!(settings.layout.max_events_per_cell, None);
    }

    #[test]
    #[serial]
    fn test_missing_or_broken_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(load_settings(Some(&missing)), Err(PlannerError::Config(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(load_settings(Some(&broken)), Err(PlannerError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var(ENV_ORIENTATION, "portrait");
        env::set_var(ENV_EVENTS_PER_CELL, "all");
        env::set_var(ENV_EXCHANGE_URL, "https://example.com/exchange");
        env::set_var(ENV_API_KEY, "secret");

        let mut settings = PlannerSettings::default();
        apply_env_overrides(&mut settings).unwrap();
        clear_env();

        assert_eq!(settings.layout.orientation, Orientation::Portrait);
        assert_eq!(settings.layout.max_events_per_cell, None);
        assert_eq!(settings.exchange.endpoint.as_deref(), Some("https://example.com/exchange"));
        assert_eq!(settings.exchange.api_key.as_deref(), Some("secret"));
    }

    #[test]
    #[serial]
    fn test_bad_env_value() {
        clear_env();
        env::set_var(ENV_EVENTS_PER_CELL, "lots");
        let result = apply_env_overrides(&mut PlannerSettings::default());
        clear_env();
        assert!(matches!(result, Err(PlannerError::Config(_))));
    }
}
