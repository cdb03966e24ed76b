//! Fill colors for heat map bins.
//!
//! Maps a bin's measure value linearly from `[0, max]` onto a two-color
//! ramp (white to orange by default). Hover tracking never uses this; it is
//! for whoever paints the rectangles.

use crate::config::HeatmapConfig;
use crate::error::{HeatgridError, Result};
use crate::types::{Dataset, Datum};

/// Low end of the default ramp
pub const LOW_COLOR: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

/// High end of the default ramp
pub const HIGH_COLOR: Rgb = Rgb::new(0xFF, 0x5A, 0x00);

/// RGB color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from a hex string (with or without #).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Convert to CSS hex string (#RRGGBB).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Interpolate toward `to`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, to: Self, t: f64) -> Self {
        Self {
            r: mix_component(self.r, to.r, t),
            g: mix_component(self.g, to.g, t),
            b: mix_component(self.b, to.b, t),
        }
    }
}

/// Parse a configured ramp color.
pub(crate) fn parse_color(hex: &str) -> Result<Rgb> {
    Rgb::from_hex(hex)
        .ok_or_else(|| HeatgridError::Config(format!("expected a #RRGGBB color, got {hex:?}")))
}

/// The cast is safe because we clamp to [0, 255] before converting.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mix_component(from: u8, to: u8, t: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    (from + (to - from) * t).clamp(0.0, 255.0).round() as u8
}

/// Linear color scale over measure values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillScale {
    pub low: Rgb,
    pub high: Rgb,
    /// Upper end of the value domain; the lower end is always 0
    pub max: f64,
}

impl FillScale {
    pub fn new(max: f64) -> Self {
        Self {
            low: LOW_COLOR,
            high: HIGH_COLOR,
            max,
        }
    }

    /// Scale whose domain ends at the largest `measure` value in `dataset`.
    pub fn for_dataset(dataset: &Dataset, measure: &str) -> Self {
        Self::new(dataset.measure_max(measure).unwrap_or(0.0))
    }

    pub fn color(&self, value: f64) -> Rgb {
        if self.max.is_nan() || self.max <= 0.0 || !value.is_finite() {
            return self.low;
        }
        self.low.mix(self.high, value / self.max)
    }

    /// Scale over `dataset` using the measure field and ramp colors of `config`.
    pub fn from_config(dataset: &Dataset, config: &HeatmapConfig) -> Result<Self> {
        Ok(Self {
            low: parse_color(&config.low_color)?,
            high: parse_color(&config.high_color)?,
            ..Self::for_dataset(dataset, &config.measure)
        })
    }

    /// Fill color for a bin, or the low color if it has no numeric measure.
    pub fn bin_color(&self, bin: &Datum, measure: &str) -> Rgb {
        Dataset::measure(bin, measure).map_or(self.low, |v| self.color(v))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::Row;
    use serde_json::json;

    #[test]
    fn test_ramp_ends() {
        let scale = FillScale::new(10.0);
        assert_eq!(scale.color(0.0).to_hex(), "#FFFFFF");
        assert_eq!(scale.color(10.0).to_hex(), "#FF5A00");
        assert_eq!(scale.color(5.0), Rgb::new(0xFF, 0xAD, 0x80));
    }

    #[test]
    fn test_out_of_domain_values_clamp() {
        let scale = FillScale::new(10.0);
        assert_eq!(scale.color(-3.0), LOW_COLOR);
        assert_eq!(scale.color(50.0), HIGH_COLOR);
        assert_eq!(scale.color(f64::NAN), LOW_COLOR);
    }

    #[test]
    fn test_zero_max_is_low_color() {
        assert_eq!(FillScale::new(0.0).color(4.0), LOW_COLOR);
        assert_eq!(FillScale::for_dataset(&Dataset::default(), "count").color(1.0), LOW_COLOR);
    }

    #[test]
    fn test_for_dataset() {
        let bins = vec![
            json!({"count": 2}).as_object().cloned().unwrap(),
            json!({"count": 8}).as_object().cloned().unwrap(),
            json!({"label": "x"}).as_object().cloned().unwrap(),
        ];
        let ds = Dataset::new(vec![Row::new(Default::default(), bins)]);
        let scale = FillScale::for_dataset(&ds, "count");
        let row = &ds.rows()[0];
        assert_eq!(scale.bin_color(&row.bins[1], "count"), HIGH_COLOR);
        assert_eq!(scale.bin_color(&row.bins[2], "count"), LOW_COLOR);
    }

    #[test]
    fn test_from_config_colors() {
        let bins = vec![json!({"hits": 4}).as_object().cloned().unwrap()];
        let ds = Dataset::new(vec![Row::new(Default::default(), bins)]);
        let config = HeatmapConfig {
            measure: "hits".to_string(),
            low_color: "#000000".to_string(),
            high_color: "0000ff".to_string(),
            ..HeatmapConfig::default()
        };
        let scale = FillScale::from_config(&ds, &config).unwrap();
        assert_eq!(scale.max, 4.0);
        assert_eq!(scale.color(2.0).to_hex(), "#000080");

        let bad = HeatmapConfig {
            high_color: "#12345".to_string(),
            ..HeatmapConfig::default()
        };
        assert!(FillScale::from_config(&ds, &bad).is_err());
    }
}
