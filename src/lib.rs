//! heatgrid - hover tracking for heat map grids
//!
//! Resolves pointer positions to heat map bins and keeps exactly one bin
//! highlighted at a time:
//! - Column/row scales derived from dataset shape and tile size
//! - Pointer-to-bin resolution against the grid's bounding rectangle
//! - An `Idle` / `Hovering` state machine firing per-bin enter/leave callbacks
//! - A controller that owns the pointer subscription and emits hover events
//!
//! # Usage (Rust)
//!
//! ```
//! use std::rc::Rc;
//! use heatgrid::hover::{GridHoverController, HoverEvent, PointerChannel};
//! use heatgrid::{Dataset, GridBounds, HeatmapConfig, PointerPosition};
//!
//! let dataset = Dataset::from_json(r#"[{"fields": {"row": "Mon"}, "bins": [{"column": "9h", "count": 4}]}]"#)?;
//! let pointer = PointerChannel::new();
//! let mut controller = GridHoverController::new(
//!     HeatmapConfig::default(),
//!     Rc::new(dataset),
//!     |event: HoverEvent| println!("{event:?}"),
//! )?;
//! controller.attach(&pointer, GridBounds::from_origin(0.0, 0.0, 25.0, 25.0));
//! pointer.emit(PointerPosition::new(10.0, 10.0));
//! controller.detach();
//! # Ok::<(), heatgrid::error::HeatgridError>(())
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { HeatmapView } from 'heatgrid';
//! await init();
//! const view = new HeatmapView(svg, rows, undefined, onHover, onHoverEnd);
//! ```

pub mod config;
pub mod error;
pub mod fill;
pub mod hover;
pub mod layout;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::HeatmapConfig;
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::HeatmapView;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
