//! Pointer-to-bin resolution.
//!
//! Converts a viewport pointer position into a bin index using the grid's
//! bounding rectangle and the current [`ScalePair`]. Pure queries only.

use super::ScalePair;
use crate::types::{BinIdentity, GridBounds, PointerPosition};

/// Result of resolving a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Pointer is over the bin at this index
    Bin(BinIdentity),
    /// Pointer is outside the grid (or the grid is empty)
    Outside,
}

impl Resolution {
    pub fn bin(self) -> Option<BinIdentity> {
        match self {
            Self::Bin(id) => Some(id),
            Self::Outside => None,
        }
    }

    pub fn is_outside(self) -> bool {
        matches!(self, Self::Outside)
    }
}

/// Resolve `pointer` against the grid whose bounding rectangle is `bounds`.
///
/// Indices are floored from the inverted scales and not clamped: a pointer
/// exactly on the right or bottom edge floors to `columns` or `rows`. Use
/// [`resolve_in_shape`] to treat such results as outside.
pub fn resolve(pointer: PointerPosition, bounds: &GridBounds, scales: &ScalePair) -> Resolution {
    if scales.is_empty() || !bounds.contains(pointer) {
        return Resolution::Outside;
    }

    let column = scales
        .column_scale
        .invert(pointer.x - bounds.left)
        .and_then(floor_index);
    let row = scales
        .row_scale
        .invert(pointer.y - bounds.top)
        .and_then(floor_index);

    match (row, column) {
        (Some(row), Some(column)) => Resolution::Bin(BinIdentity::new(row, column)),
        _ => Resolution::Outside,
    }
}

/// Like [`resolve`], but indices outside the scales' grid shape become
/// [`Resolution::Outside`].
pub fn resolve_in_shape(
    pointer: PointerPosition,
    bounds: &GridBounds,
    scales: &ScalePair,
) -> Resolution {
    match resolve(pointer, bounds, scales) {
        Resolution::Bin(id) if scales.shape.contains(id) => Resolution::Bin(id),
        _ => Resolution::Outside,
    }
}

/// Floor a domain value to a bin index, or `None` if it is not a valid index.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_index(value: f64) -> Option<u32> {
    let floored = value.floor();
    if floored.is_finite() && floored >= 0.0 && floored <= f64::from(u32::MAX) {
        Some(floored as u32)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::GridShape;

    fn grid_2x3() -> (ScalePair, GridBounds) {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        let bounds = GridBounds::from_origin(0.0, 0.0, scales.pixel_width, scales.pixel_height);
        (scales, bounds)
    }

    #[test]
    fn test_scenario_points() {
        let (scales, bounds) = grid_2x3();
        let at = |x, y| resolve(PointerPosition::new(x, y), &bounds, &scales);

        assert_eq!(at(25.0, 5.0), Resolution::Bin(BinIdentity::new(0, 2)));
        assert_eq!(at(5.0, 15.0), Resolution::Bin(BinIdentity::new(1, 0)));
        assert_eq!(at(35.0, 5.0), Resolution::Outside);
    }

    #[test]
    fn test_offset_origin() {
        let scales = ScalePair::build(GridShape::new(2, 3), 10.0);
        let bounds = GridBounds::from_origin(100.0, 50.0, 30.0, 20.0);
        let at = |x, y| resolve(PointerPosition::new(x, y), &bounds, &scales);

        assert_eq!(at(125.0, 55.0), Resolution::Bin(BinIdentity::new(0, 2)));
        assert_eq!(at(99.0, 55.0), Resolution::Outside);
        assert_eq!(at(105.0, 49.5), Resolution::Outside);
    }

    #[test]
    fn test_edge_floors_out_of_range() {
        let (scales, bounds) = grid_2x3();

        // The far edges are inside the rectangle but floor past the last bin
        let edge = resolve(PointerPosition::new(30.0, 20.0), &bounds, &scales);
        assert_eq!(edge, Resolution::Bin(BinIdentity::new(2, 3)));
        assert!(!scales.shape.contains(edge.bin().unwrap()));
        assert_eq!(
            resolve_in_shape(PointerPosition::new(30.0, 20.0), &bounds, &scales),
            Resolution::Outside
        );

        // The near edges are index 0
        assert_eq!(
            resolve_in_shape(PointerPosition::new(0.0, 0.0), &bounds, &scales),
            Resolution::Bin(BinIdentity::new(0, 0))
        );
    }

    #[test]
    fn test_empty_grid_is_outside() {
        let scales = ScalePair::build(GridShape::new(0, 0), 10.0);
        let bounds = GridBounds::from_origin(0.0, 0.0, 0.0, 0.0);
        assert!(resolve(PointerPosition::new(0.0, 0.0), &bounds, &scales).is_outside());
    }

    #[test]
    fn test_nan_pointer_is_outside() {
        let (scales, bounds) = grid_2x3();
        assert!(resolve(PointerPosition::new(f64::NAN, 5.0), &bounds, &scales).is_outside());
        assert!(resolve(PointerPosition::new(5.0, f64::NAN), &bounds, &scales).is_outside());
    }

    #[test]
    fn test_floor_index() {
        assert_eq!(floor_index(0.0), Some(0));
        assert_eq!(floor_index(2.999), Some(2));
        assert_eq!(floor_index(-0.5), None);
        assert_eq!(floor_index(f64::INFINITY), None);
    }
}
