//! Grid and viewport configuration.

use serde::{Deserialize, Serialize};

use crate::cell::{Color, GRID_DIM};

pub const CELL_PX: f64 = 2.0;
pub const INITIAL_SCALE: f64 = 1.0;
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 10.0;
pub const SCALE_FACTOR: f64 = 1.2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for the grid, the view transform and the renderer.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of the grid in cells.
    pub grid_dim: i64,
    /// Rendered size of one cell at scale 1, in screen pixels.
    pub cell_px: f64,
    pub initial_scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Multiplier applied per zoom step.
    pub scale_factor: f64,
    /// Selection color and fallback for unparseable pixel colors.
    pub default_color: Color,
    pub background_color: Color,
    pub selected_alpha: f32,
    pub selection_fill_alpha: f32,
    pub grid_line_alpha: f32,
    /// Grid lines are drawn only above this scale.
    pub grid_line_min_scale: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_dim: GRID_DIM,
            cell_px: CELL_PX,
            initial_scale: INITIAL_SCALE,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            scale_factor: SCALE_FACTOR,
            default_color: Color::BITCOIN,
            background_color: Color::BACKGROUND,
            selected_alpha: 0.5,
            selection_fill_alpha: 0.3,
            grid_line_alpha: 0.1,
            grid_line_min_scale: 1.0,
        }
    }
}

impl GridConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.grid_dim <= 0 {
            return invalid("grid_dim", "must be positive");
        }
        if !(self.cell_px > 0.0) {
            return invalid("cell_px", "must be positive");
        }
        if !(self.min_scale > 0.0) {
            return invalid("min_scale", "must be positive");
        }
        if self.min_scale >= self.max_scale {
            return invalid("max_scale", "must be greater than min_scale");
        }
        if !(self.min_scale..=self.max_scale).contains(&self.initial_scale) {
            return invalid("initial_scale", "must lie within [min_scale, max_scale]");
        }
        if !(self.scale_factor > 1.0) {
            return invalid("scale_factor", "must be greater than 1");
        }
        Ok(())
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_dim, 10_000);
        assert_eq!(config.cell_px, 2.0);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = GridConfig::from_json(r#"{ "grid_dim": 1000, "max_scale": 4.0 }"#).unwrap();
        assert_eq!(config.grid_dim, 1000);
        assert_eq!(config.max_scale, 4.0);
        assert_eq!(config.min_scale, MIN_SCALE);
    }

    #[test]
    fn test_rejects_inverted_scale_range() {
        let err = GridConfig::from_json(r#"{ "min_scale": 5.0, "max_scale": 2.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_scale", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(GridConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
