//! Engine configuration loaded from JSON.

use crate::shapes::{HitTolerance, ShapeStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "engine.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Rules applied when a drawing gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// A box or line is kept only if either extent exceeds this, in canvas units.
    pub min_extent: f64,
    pub text_min_width: f64,
    pub text_min_height: f64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            min_extent: 2.0,
            text_min_width: 200.0,
            text_min_height: 100.0,
        }
    }
}

/// Selection handle layout and picking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Hit radius in screen pixels.
    pub hit_radius: f64,
    /// Distance of the rotation handle above the top edge, canvas units.
    pub rotate_offset: f64,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            hit_radius: 12.0,
            rotate_offset: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per unit of wheel delta.
    pub wheel_zoom_factor: f64,
    /// Padding per side when fitting the background image.
    pub fit_padding: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            wheel_zoom_factor: 0.001,
            fit_padding: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub display_width: f64,
    pub max_bytes: usize,
    /// New images land this far inside the visible top-left corner.
    pub placement_margin: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            display_width: 300.0,
            max_bytes: 1_000_000,
            placement_margin: 100.0,
        }
    }
}

/// Everything tunable about the transform engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub draw: DrawConfig,
    pub handles: HandleConfig,
    pub hit: HitTolerance,
    pub viewport: ViewportConfig,
    pub images: ImageConfig,
    /// Style given to new annotations.
    pub style: ShapeStyle,
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Like [`EngineConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// `<config_dir>/threadboard/engine.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("threadboard").join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport = &self.viewport;
        if !(viewport.min_zoom > 0.0 && viewport.max_zoom > 0.0) {
            return Err(ConfigError::Invalid("zoom bounds must be positive".into()));
        }
        if viewport.min_zoom > viewport.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "min_zoom {} exceeds max_zoom {}",
                viewport.min_zoom, viewport.max_zoom
            )));
        }
        let non_negative = [
            ("draw.min_extent", self.draw.min_extent),
            ("draw.text_min_width", self.draw.text_min_width),
            ("draw.text_min_height", self.draw.text_min_height),
            ("handles.hit_radius", self.handles.hit_radius),
            ("handles.rotate_offset", self.handles.rotate_offset),
            ("hit.min_box_extent", self.hit.min_box_extent),
            ("hit.stroke_tolerance", self.hit.stroke_tolerance),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| !(*v >= 0.0)) {
            return Err(ConfigError::Invalid(format!("{name} must be non-negative, got {value}")));
        }
        if !(self.images.display_width > 0.0) {
            return Err(ConfigError::Invalid("images.display_width must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!((config.draw.min_extent - 2.0).abs() < f64::EPSILON);
        assert!((config.handles.rotate_offset - 25.0).abs() < f64::EPSILON);
        assert!((config.viewport.max_zoom - 5.0).abs() < f64::EPSILON);
        assert!((config.images.display_width - 300.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = EngineConfig::from_json(r#"{ "draw": { "min_extent": 5.0 } }"#).unwrap();
        assert!((config.draw.min_extent - 5.0).abs() < f64::EPSILON);
        assert!((config.draw.text_min_width - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.images, ImageConfig::default());
    }

    #[test]
    fn test_rejects_inverted_zoom_bounds() {
        let err = EngineConfig::from_json(r#"{ "viewport": { "min_zoom": 4.0, "max_zoom": 2.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let err = EngineConfig::from_json(r#"{ "draw": { "min_extent": -1.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("draw.min_extent"));
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "handles": {{ "hit_radius": 20.0 }} }}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert!((config.handles.hit_radius - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_default_path_is_namespaced() {
        if let Some(path) = EngineConfig::default_path() {
            assert!(path.ends_with("threadboard/engine.json"));
        }
    }
}
