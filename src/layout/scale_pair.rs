//! Column and row scales derived from dataset shape and tile size.
//!
//! The row scale keeps the inverted domain `[rows, 0] -> [height, 0]` used by
//! the rectangle painter, so painted rectangles and hit testing agree on
//! every pixel. Resolving a row means inverting this scale and flooring.

use serde::Serialize;

use super::LinearScale;
use crate::types::{BinIdentity, GridShape};

/// Painted rectangle of one bin in pixels, relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scales for one dataset shape and tile size.
///
/// Never reuse a `ScalePair` after the shape or tile size changes; build a
/// new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePair {
    pub column_scale: LinearScale,
    pub row_scale: LinearScale,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub shape: GridShape,
    pub tile_size: f64,
}

impl ScalePair {
    pub fn build(shape: GridShape, tile_size: f64) -> Self {
        let (columns, rows) = if shape.is_empty() {
            (0.0, 0.0)
        } else {
            (f64::from(shape.columns), f64::from(shape.rows))
        };
        let pixel_width = tile_size * columns;
        let pixel_height = tile_size * rows;

        Self {
            column_scale: LinearScale::new((0.0, columns), (0.0, pixel_width)),
            row_scale: LinearScale::new((rows, 0.0), (pixel_height, 0.0)),
            pixel_width,
            pixel_height,
            shape,
            tile_size,
        }
    }

    /// True when every lookup must resolve to outside.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Whether these scales were built for `shape` and `tile_size`.
    pub fn matches(&self, shape: GridShape, tile_size: f64) -> bool {
        self.shape == shape && self.tile_size.to_bits() == tile_size.to_bits()
    }

    /// Top-left pixel corner of a bin, relative to the grid origin.
    pub fn bin_origin(&self, id: BinIdentity) -> (f64, f64) {
        (
            self.column_scale.apply(f64::from(id.column)),
            self.row_scale.apply(f64::from(id.row)),
        )
    }

    /// Rectangle to paint for `id`, leaving `gap` pixels free before each
    /// tile along both axes. `None` when `id` is not in the shape.
    ///
    /// Hit testing still uses the whole tile, so the gap belongs to the bin.
    pub fn bin_rect(&self, id: BinIdentity, gap: f64) -> Option<BinRect> {
        if !self.shape.contains(id) {
            return None;
        }
        let gap = if gap.is_nan() { 0.0 } else { gap.clamp(0.0, self.tile_size) };
        let (x, y) = self.bin_origin(id);
        Some(BinRect {
            x: x + gap,
            y: y + gap,
            width: self.tile_size - gap,
            height: self.tile_size - gap,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dimensions() {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        assert_eq!(scales.pixel_width, 30.0);
        assert_eq!(scales.pixel_height, 20.0);
        assert_eq!(scales.row_scale.domain, (2.0, 0.0));
        assert_eq!(scales.row_scale.range, (20.0, 0.0));
        assert_eq!(scales.column_scale.invert(25.0), Some(2.5));
        assert_eq!(scales.row_scale.invert(15.0), Some(1.5));
    }

    #[test]
    fn test_empty_shape_has_no_area() {
        for shape in [GridShape::new(0, 0), GridShape::new(3, 0)] {
            let scales = ScalePair::build(shape, 25.0);
            assert!(scales.is_empty());
            assert_eq!(scales.pixel_width, 0.0);
            assert_eq!(scales.pixel_height, 0.0);
            assert_eq!(scales.column_scale.invert(1.0), None);
        }
    }

    #[test]
    fn test_matches() {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        assert!(scales.matches(GridShape::new(2, 3), 10.0));
        assert!(!scales.matches(GridShape::new(1, 3), 10.0));
        assert!(!scales.matches(GridShape::new(2, 3), 12.0));
    }

    #[test]
    fn test_bin_origin() {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        assert_eq!(scales.bin_origin(BinIdentity::new(1, 2)), (20.0, 10.0));
    }

    #[test]
    fn test_bin_rect_applies_gap() {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        let rect = scales.bin_rect(BinIdentity::new(1, 2), 2.0).unwrap();
        assert_eq!(
            rect,
            BinRect {
                x: 22.0,
                y: 12.0,
                width: 8.0,
                height: 8.0
            }
        );
        assert_eq!(scales.bin_rect(BinIdentity::new(0, 0), 15.0).unwrap().width, 0.0);
        assert_eq!(scales.bin_rect(BinIdentity::new(2, 0), 2.0), None);
    }
}
