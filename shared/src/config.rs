use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canvas::SelectionStyle;

pub const DEFAULT_MIN_SELECTION_SIZE: f64 = 2.0;
pub const DEFAULT_ZOOM_IN_FACTOR: f64 = 2.0;
pub const DEFAULT_ZOOM_OUT_FACTOR: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value {value:?} for `{key}`")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub min_selection_size: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub active_color: String,
    pub archived_color: String,
    pub line_width: f64,
    pub debug: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_selection_size: DEFAULT_MIN_SELECTION_SIZE,
            zoom_in_factor: DEFAULT_ZOOM_IN_FACTOR,
            zoom_out_factor: DEFAULT_ZOOM_OUT_FACTOR,
            active_color: "#ff4081".to_string(),
            archived_color: "#00e5ff".to_string(),
            line_width: 2.0,
            debug: false,
        }
    }
}

impl ViewerConfig {
    /// Applies overrides from a URL query such as `?min_size=4&zoom=3&debug=1`.
    /// Unknown keys are skipped.
    pub fn from_query(query: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "min_size" => config.min_selection_size = parse_positive(key, value)?,
                "zoom" => {
                    let factor = parse_positive(key, value)?;
                    config.zoom_in_factor = factor;
                    config.zoom_out_factor = 1.0 / factor;
                }
                "zoom_in" => config.zoom_in_factor = parse_positive(key, value)?,
                "zoom_out" => config.zoom_out_factor = parse_positive(key, value)?,
                "line_width" => config.line_width = parse_positive(key, value)?,
                "active_color" => config.active_color = parse_color(key, value)?,
                "archived_color" => config.archived_color = parse_color(key, value)?,
                "debug" | "log" => config.debug = parse_flag(key, value)?,
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn active_style(&self) -> SelectionStyle {
        SelectionStyle::new(self.active_color.clone(), self.line_width)
    }

    pub fn archived_style(&self) -> SelectionStyle {
        SelectionStyle::new(self.archived_color.clone(), self.line_width)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<f64, ConfigError> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => Ok(parsed),
        _ => Err(invalid(key, value)),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "" | "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_color(key: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.replace("%23", "#");
    if value.is_empty() || value.len() > 32 {
        return Err(invalid(key, &value));
    }
    Ok(value)
}
