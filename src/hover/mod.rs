//! Hover tracking for the heat map grid.
//!
//! - [`HoverCoordinator`]: the `Idle` / `Hovering` state machine and per-bin callbacks
//! - [`PointerSource`] / [`Subscription`]: pointer stream plumbing
//! - [`GridHoverController`]: ties a pointer stream, the resolver and the coordinator together

mod controller;
mod coordinator;
mod stream;

pub use controller::{BoundsProvider, GridHoverController, HoverEvent, HoverListener};
pub use coordinator::{HoverCallbacks, HoverCoordinator, HoverState, Transition};
pub use stream::{PointerChannel, PointerHandler, PointerSource, Subscription};
