use serde::{Deserialize, Serialize};

/// Identity of one bin: its row and column in the dataset.
///
/// Used as the key for hover callback registration. Stable across re-renders
/// as long as the dataset shape does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BinIdentity {
    pub row: u32,
    pub column: u32,
}

impl BinIdentity {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for BinIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.row, self.column)
    }
}

/// Pointer position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the grid in viewport pixels.
///
/// Edges are inclusive: a pointer exactly on `right` or `bottom` is inside
/// the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridBounds {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl GridBounds {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Rectangle of the given size with its top-left corner at (`left`, `top`).
    pub fn from_origin(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
        }
    }

    pub fn contains(&self, p: PointerPosition) -> bool {
        // NaN coordinates fail every comparison and land outside
        p.y >= self.top && p.y <= self.bottom && p.x >= self.left && p.x <= self.right
    }
}

/// Resolved hover target sent to the tooltip/highlight renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverPayload {
    pub row: u32,
    pub column: u32,
    pub record: super::Datum,
    pub row_label: String,
    pub column_label: String,
}
