//! Coordinate math for the heat map grid.
//!
//! This module handles:
//! - Linear scales between bin indices and pixels
//! - Deriving the column/row scale pair from dataset shape and tile size
//! - Resolving pointer positions to bin indices

mod resolver;
mod scale;
mod scale_pair;

pub use resolver::{resolve, resolve_in_shape, Resolution};
pub use scale::LinearScale;
pub use scale_pair::{BinRect, ScalePair};
