//! Heat map configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HeatgridError, Result};
use crate::fill::{parse_color, HIGH_COLOR, LOW_COLOR};

/// Default tile size in pixels per bin
pub const DEFAULT_TILE_SIZE: f64 = 25.0;

/// Default gap between painted rectangles in pixels
pub const DEFAULT_GAP: f64 = 2.0;

/// Configuration for one heat map instance.
///
/// Field names default to `count` for the measure, `row` for the left-axis
/// label and `column` for the top-axis label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeatmapConfig {
    /// Pixels per bin, both horizontally and vertically
    pub tile_size: f64,
    /// Pixels between painted rectangles (painting only; hit testing ignores it)
    pub gap: f64,
    /// Bin field holding the measure value
    pub measure: String,
    /// Row field holding the row label
    pub row_label: String,
    /// Bin field holding the column label
    pub column_label: String,
    /// Fill for a zero measure (`#RRGGBB`)
    pub low_color: String,
    /// Fill for the largest measure (`#RRGGBB`)
    pub high_color: String,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            gap: DEFAULT_GAP,
            measure: "count".to_string(),
            row_label: "row".to_string(),
            column_label: "column".to_string(),
            low_color: LOW_COLOR.to_hex(),
            high_color: HIGH_COLOR.to_hex(),
        }
    }
}

impl HeatmapConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_tile_size(self.tile_size)?;
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(HeatgridError::Config(format!(
                "gap must be a non-negative number, got {}",
                self.gap
            )));
        }
        parse_color(&self.low_color)?;
        parse_color(&self.high_color)?;
        Ok(())
    }
}

pub(crate) fn validate_tile_size(tile_size: f64) -> Result<()> {
    if tile_size.is_finite() && tile_size > 0.0 {
        Ok(())
    } else {
        Err(HeatgridError::Config(format!(
            "tile size must be a positive number, got {tile_size}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HeatmapConfig::default();
        assert_eq!(config.tile_size, 25.0);
        assert_eq!(config.gap, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HeatmapConfig::from_json(r#"{"tileSize": 10, "measure": "hits"}"#).unwrap();
        assert_eq!(config.tile_size, 10.0);
        assert_eq!(config.measure, "hits");
        assert_eq!(config.row_label, "row");
    }

    #[test]
    fn test_rejects_bad_tile_size() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = HeatmapConfig {
                tile_size: bad,
                ..HeatmapConfig::default()
            };
            assert!(matches!(config.validate(), Err(HeatgridError::Config(_))));
        }
    }

    #[test]
    fn test_ramp_colors() {
        let config = HeatmapConfig::from_json(r##"{"highColor": "#0000ff"}"##).unwrap();
        assert_eq!(config.low_color, "#FFFFFF");
        assert_eq!(config.high_color, "#0000ff");

        let err = HeatmapConfig::from_json(r#"{"lowColor": "white"}"#).unwrap_err();
        assert!(matches!(err, HeatgridError::Config(msg) if msg.contains("white")));
    }

    #[test]
    fn test_rejects_negative_gap() {
        let config = HeatmapConfig {
            gap: -2.0,
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
