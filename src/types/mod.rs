//! Data types for the heat map grid.

mod dataset;
mod geometry;

pub use dataset::*;
pub use geometry::*;
