//! Visualization Configuration
//!
//! Tunables for the ingestion pipeline and the interaction defaults, loadable
//! from a JSON file. Every field has a default, so a partial file only
//! overrides what it names.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Palette;
use crate::layout::LayoutConfig;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the visualization core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizationConfig {
    /// Node placement parameters
    pub layout: LayoutConfig,

    /// State color derivation
    pub palette: Palette,

    /// Probability threshold when a session opens
    pub initial_threshold: f64,

    /// Selected scale when a session opens
    pub initial_scale: usize,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            palette: Palette::default(),
            initial_threshold: 0.1,
            initial_scale: 0,
        }
    }
}

impl VisualizationConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&document)?;
        log::info!("Loaded visualization configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if !(layout.max_radius.is_finite() && layout.max_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "maxRadius must be positive, got {}",
                layout.max_radius
            )));
        }
        if !(0.0..=1.0).contains(&layout.min_radius_fraction) {
            return Err(ConfigError::Invalid(format!(
                "minRadiusFraction must lie in [0, 1], got {}",
                layout.min_radius_fraction
            )));
        }
        if !(layout.orbit_radius.is_finite() && layout.orbit_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "orbitRadius must be non-negative, got {}",
                layout.orbit_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_threshold) {
            return Err(ConfigError::Invalid(format!(
                "initialThreshold must lie in [0, 1], got {}",
                self.initial_threshold
            )));
        }
        match &self.palette {
            Palette::Categorical { colors } if colors.is_empty() => Err(ConfigError::Invalid(
                "categorical palette needs at least one color".to_string(),
            )),
            Palette::GoldenRatio {
                saturation,
                lightness,
            } if !(0.0..=1.0).contains(saturation) || !(0.0..=1.0).contains(lightness) => {
                Err(ConfigError::Invalid(
                    "golden-ratio saturation and lightness must lie in [0, 1]".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Color;

    #[test]
    fn test_defaults() {
        let config = VisualizationConfig::default();
        assert_eq!(config.layout.max_radius, 130.0);
        assert_eq!(config.initial_threshold, 0.1);
        assert_eq!(config.initial_scale, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = VisualizationConfig::from_json_str(
            r##"{ "layout": { "maxRadius": 80 }, "palette": { "kind": "categorical", "colors": ["#000000", "#ffffff"] } }"##,
        )
        .unwrap();

        assert_eq!(config.layout.max_radius, 80.0);
        assert_eq!(config.layout.min_radius_fraction, 0.1);
        assert_eq!(config.initial_threshold, 0.1);
        assert_eq!(
            config.palette,
            Palette::Categorical {
                colors: vec![Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)]
            }
        );
    }

    #[test]
    fn test_golden_ratio_palette() {
        let config = VisualizationConfig::from_json_str(
            r#"{ "palette": { "kind": "goldenRatio", "saturation": 0.5, "lightness": 0.5 } }"#,
        )
        .unwrap();
        assert!(matches!(config.palette, Palette::GoldenRatio { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for document in [
            r#"{ "layout": { "maxRadius": 0 } }"#,
            r#"{ "layout": { "minRadiusFraction": 1.5 } }"#,
            r#"{ "initialThreshold": 2 }"#,
            r#"{ "palette": { "kind": "categorical", "colors": [] } }"#,
        ] {
            assert!(
                matches!(
                    VisualizationConfig::from_json_str(document),
                    Err(ConfigError::Invalid(_))
                ),
                "{document}"
            );
        }

        assert!(matches!(
            VisualizationConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = VisualizationConfig::load("/nonexistent/scalechain.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
