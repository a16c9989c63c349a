//! Viewer configuration.

use crate::pdf::RenderMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How page numbers are attached to page cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNumbering {
    /// A load-time script labels cards in display order.
    #[default]
    Script,
    /// Labels are written into each card; no scripting needed.
    Inline,
    /// No labels.
    None,
}

/// Settings the viewer applies to its display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub javascript_enabled: bool,
    pub zoom_enabled: bool,
    /// Built-in zoom gestures stay on, the on-screen buttons are hidden.
    pub show_zoom_controls: bool,
    pub wide_viewport: bool,
    /// Start zoomed out so the page width fits the screen.
    pub overview_mode: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
            zoom_enabled: true,
            show_zoom_controls: false,
            wide_viewport: true,
            overview_mode: true,
        }
    }
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Output pixels per PDF point.
    #[serde(default = "default_scale")]
    pub density: f32,

    #[serde(default = "default_scale")]
    pub zoom: f32,

    /// Skip pages that fail to render instead of failing the document.
    #[serde(default = "default_lenient")]
    pub lenient: bool,

    #[serde(default)]
    pub page_numbering: PageNumbering,

    #[serde(default)]
    pub render_mode: RenderMode,

    /// File name bundled resources are copied to inside their cache directory.
    #[serde(default = "default_cache_file_name")]
    pub cache_file_name: String,

    /// Explicit PDFium shared library to bind.
    #[serde(default)]
    pub pdfium_library: Option<PathBuf>,

    #[serde(default)]
    pub display: DisplaySettings,
}

fn default_scale() -> f32 { 1.0 }
fn default_lenient() -> bool { true }
fn default_cache_file_name() -> String { "webview.pdf".to_string() }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            density: default_scale(),
            zoom: default_scale(),
            lenient: default_lenient(),
            page_numbering: PageNumbering::default(),
            render_mode: RenderMode::default(),
            cache_file_name: default_cache_file_name(),
            pdfium_library: None,
            display: DisplaySettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("density", self.density), ("zoom", self.zoom)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let name = self.cache_file_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "cache_file_name must be a plain file name, got {name:?}"
            )));
        }
        Ok(())
    }

    /// Numbering actually used, given the display settings.
    pub fn effective_numbering(&self) -> PageNumbering {
        match self.page_numbering {
            PageNumbering::Script if !self.display.javascript_enabled => PageNumbering::Inline,
            other => other,
        }
    }
}
