//! Grid hover controller.
//!
//! Subscribes to a pointer stream, resolves every update to a bin, runs it
//! through the [`HoverCoordinator`] and reports hover changes to a
//! [`HoverListener`]. One update is processed to completion before the next.
//!
//! User code (bin callbacks, the listener, the bounds provider) never runs
//! while the controller's state is borrowed. State changes are applied first
//! and their effects queued; the queue is then drained in order. Calls made
//! from inside a callback (registering bins, querying state, detaching) take
//! effect immediately and their own effects run after the current callback
//! returns.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde::Serialize;

use super::coordinator::{HoverCallbacks, HoverCoordinator, HoverState, StagedCallback, Transition};
use super::stream::{PointerSource, Subscription};
use crate::config::{validate_tile_size, HeatmapConfig};
use crate::error::Result;
use crate::layout::{resolve_in_shape, Resolution, ScalePair};
use crate::types::{label_text, BinIdentity, Dataset, GridBounds, HoverPayload, PointerPosition};

/// Event emitted to the tooltip/highlight renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HoverEvent {
    HoverChanged(HoverPayload),
    HoverEnded,
}

/// Receives hover changes, at most once per state transition.
pub trait HoverListener {
    fn hover_changed(&mut self, payload: HoverPayload);
    fn hover_ended(&mut self);
}

impl<F: FnMut(HoverEvent)> HoverListener for F {
    fn hover_changed(&mut self, payload: HoverPayload) {
        self(HoverEvent::HoverChanged(payload));
    }

    fn hover_ended(&mut self) {
        self(HoverEvent::HoverEnded);
    }
}

/// Supplies the grid's current bounding rectangle in viewport pixels.
///
/// Queried on every pointer update since scrolling and resizing move the
/// grid. `None` means the grid is not mounted and the update is ignored.
pub trait BoundsProvider {
    fn bounds(&self) -> Option<GridBounds>;
}

impl BoundsProvider for GridBounds {
    fn bounds(&self) -> Option<GridBounds> {
        Some(*self)
    }
}

impl<F: Fn() -> Option<GridBounds>> BoundsProvider for F {
    fn bounds(&self) -> Option<GridBounds> {
        self()
    }
}

/// Work left over once a state change has been applied.
enum Effect {
    Callback(StagedCallback),
    Event(HoverEvent),
}

struct ControllerCore {
    config: HeatmapConfig,
    dataset: Rc<Dataset>,
    scales: Option<ScalePair>,
    coordinator: HoverCoordinator,
}

impl ControllerCore {
    fn handle_pointer(&mut self, position: PointerPosition, bounds: &GridBounds, out: &mut Vec<Effect>) {
        let scales = self.current_scales(out);

        let resolution = match resolve_in_shape(position, bounds, &scales) {
            // Gaps at the end of short rows have no record to hover
            Resolution::Bin(id) if self.dataset.bin(id).is_some() => Resolution::Bin(id),
            _ => Resolution::Outside,
        };

        let transition = self.coordinator.stage_notify(resolution);
        self.collect(transition, out);
    }

    /// Cached scales if shape and tile size are unchanged, otherwise fresh
    /// ones. A shape change first drops the hovered bin, whose identity may
    /// no longer exist.
    fn current_scales(&mut self, out: &mut Vec<Effect>) -> ScalePair {
        let shape = self.dataset.shape();
        let tile_size = self.config.tile_size;

        if let Some(scales) = self.scales {
            if scales.matches(shape, tile_size) {
                return scales;
            }
            if scales.shape != shape {
                let transition = self.coordinator.stage_notify(Resolution::Outside);
                if transition.is_left() {
                    tracing::debug!(?transition, old = ?scales.shape, new = ?shape, "dataset reshaped while hovering");
                }
                self.collect(transition, out);
            }
        }

        let scales = ScalePair::build(shape, tile_size);
        self.scales = Some(scales);
        scales
    }

    fn force_idle(&mut self, out: &mut Vec<Effect>) {
        let transition = self.coordinator.stage_notify(Resolution::Outside);
        self.collect(transition, out);
    }

    /// Queue the staged bin callbacks, then the listener event for `transition`.
    fn collect(&mut self, transition: Transition, out: &mut Vec<Effect>) {
        out.extend(self.coordinator.take_staged().into_iter().map(Effect::Callback));
        if let Some(id) = transition.entered() {
            match self.payload(id) {
                Some(payload) => out.push(Effect::Event(HoverEvent::HoverChanged(payload))),
                None => tracing::warn!(bin = %id, "hovered bin has no record"),
            }
        } else if transition.is_left() {
            out.push(Effect::Event(HoverEvent::HoverEnded));
        }
    }

    fn payload(&self, id: BinIdentity) -> Option<HoverPayload> {
        let row = self.dataset.row(id.row)?;
        let record = self.dataset.bin(id)?;
        Some(HoverPayload {
            row: id.row,
            column: id.column,
            record: record.clone(),
            row_label: label_text(&row.fields, &self.config.row_label),
            column_label: label_text(record, &self.config.column_label),
        })
    }
}

struct Shared {
    attached: Cell<bool>,
    /// Set while queued effects are running
    dispatching: Cell<bool>,
    core: RefCell<ControllerCore>,
    bounds: RefCell<Option<Rc<dyn BoundsProvider>>>,
    listener: RefCell<Box<dyn HoverListener>>,
    effects: RefCell<VecDeque<Effect>>,
}

impl Shared {
    fn handle_pointer(&self, position: PointerPosition) {
        if !self.attached.get() {
            return;
        }
        if self.dispatching.get() {
            tracing::warn!(?position, "pointer update arrived during hover processing, dropped");
            return;
        }
        let provider = self.bounds.borrow().as_ref().map(Rc::clone);
        let Some(bounds) = provider.and_then(|p| p.bounds()) else {
            return;
        };
        // The provider is user code and may have detached us
        if !self.attached.get() {
            return;
        }
        self.update(|core, out| core.handle_pointer(position, &bounds, out));
    }

    /// Apply a state change with `core` borrowed, then run its effects with
    /// nothing borrowed.
    fn update<R>(&self, change: impl FnOnce(&mut ControllerCore, &mut Vec<Effect>) -> R) -> R {
        let mut out = Vec::new();
        let result = change(&mut *self.core.borrow_mut(), &mut out);
        self.effects.borrow_mut().extend(out);
        self.dispatch();
        result
    }

    /// Run queued effects in order. Nested calls return at once and leave
    /// their effects to the outer loop.
    fn dispatch(&self) {
        if self.dispatching.replace(true) {
            return;
        }
        while let Some(effect) = self.next_effect() {
            match effect {
                Effect::Callback(callback) => callback.run(),
                Effect::Event(HoverEvent::HoverChanged(payload)) => {
                    self.listener.borrow_mut().hover_changed(payload);
                }
                Effect::Event(HoverEvent::HoverEnded) => self.listener.borrow_mut().hover_ended(),
            }
        }
        self.dispatching.set(false);
    }

    fn next_effect(&self) -> Option<Effect> {
        self.effects.borrow_mut().pop_front()
    }
}

/// Connects a pointer stream to the hover state of one heat map.
///
/// The controller exclusively owns its scales and coordinator state; the
/// dataset is a shared read-only snapshot. Dropping the controller detaches.
pub struct GridHoverController {
    shared: Rc<Shared>,
    subscription: Option<Subscription>,
}

impl GridHoverController {
    pub fn new(
        config: HeatmapConfig,
        dataset: Rc<Dataset>,
        listener: impl HoverListener + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let core = ControllerCore {
            config,
            dataset,
            scales: None,
            coordinator: HoverCoordinator::new(),
        };
        Ok(Self {
            shared: Rc::new(Shared {
                attached: Cell::new(false),
                dispatching: Cell::new(false),
                core: RefCell::new(core),
                bounds: RefCell::new(None),
                listener: RefCell::new(Box::new(listener)),
                effects: RefCell::new(VecDeque::new()),
            }),
            subscription: None,
        })
    }

    /// Start observing `source`. Any previous subscription is released first.
    pub fn attach<S>(&mut self, source: &S, bounds: impl BoundsProvider + 'static)
    where
        S: PointerSource + ?Sized,
    {
        if self.is_attached() {
            self.detach();
        }
        let bounds: Rc<dyn BoundsProvider> = Rc::new(bounds);
        *self.shared.bounds.borrow_mut() = Some(bounds);
        self.shared.attached.set(true);

        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        self.subscription = Some(source.subscribe(Box::new(move |position| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_pointer(position);
            }
        })));
        tracing::debug!("hover controller attached");
    }

    /// Stop observing and clear any active hover. Safe to call repeatedly.
    ///
    /// The state is `Idle` when this returns. No callback fires for pointer
    /// updates delivered afterwards. Called from inside a hover callback, the
    /// active bin's leave and `hover_ended` run as soon as that callback
    /// returns.
    pub fn detach(&mut self) {
        let was_attached = self.shared.attached.replace(false);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if !was_attached {
            return;
        }

        *self.shared.bounds.borrow_mut() = None;
        self.shared.update(ControllerCore::force_idle);
        tracing::debug!("hover controller detached");
    }

    pub fn is_attached(&self) -> bool {
        self.shared.attached.get()
    }

    /// Process one pointer update; ignored while detached.
    pub fn handle_pointer(&self, position: PointerPosition) {
        self.shared.handle_pointer(position);
    }

    /// Replace the dataset snapshot.
    ///
    /// If the shape changed, the hovered bin is left on the next pointer
    /// update, before scales are rebuilt.
    pub fn set_dataset(&mut self, dataset: Rc<Dataset>) {
        self.shared.core.borrow_mut().dataset = dataset;
    }

    pub fn set_tile_size(&mut self, tile_size: f64) -> Result<()> {
        validate_tile_size(tile_size)?;
        self.shared.core.borrow_mut().config.tile_size = tile_size;
        Ok(())
    }

    pub fn register(&mut self, id: BinIdentity, callbacks: HoverCallbacks) {
        self.shared.update(|core, out| {
            core.coordinator.stage_register(id, callbacks);
            core.collect(Transition::Unchanged, out);
        });
    }

    pub fn unregister(&mut self, id: BinIdentity) {
        self.shared.update(|core, out| {
            let transition = core.coordinator.stage_unregister(id);
            core.collect(transition, out);
        });
    }

    pub fn state(&self) -> HoverState {
        self.shared.core.borrow().coordinator.state()
    }

    pub fn dataset(&self) -> Rc<Dataset> {
        Rc::clone(&self.shared.core.borrow().dataset)
    }

    pub fn config(&self) -> HeatmapConfig {
        self.shared.core.borrow().config.clone()
    }

    /// Scales for the current dataset and tile size, for painting.
    pub fn scales(&self) -> ScalePair {
        let core = self.shared.core.borrow();
        ScalePair::build(core.dataset.shape(), core.config.tile_size)
    }
}

impl Drop for GridHoverController {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for GridHoverController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridHoverController")
            .field("attached", &self.is_attached())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::hover::PointerChannel;
    use crate::types::Row;
    use serde_json::json;

    fn dataset(rows: usize, columns: usize) -> Rc<Dataset> {
        let rows = (0..rows)
            .map(|r| {
                let fields = json!({"row": format!("r{r}")}).as_object().cloned().unwrap();
                let bins = (0..columns)
                    .map(|c| {
                        json!({"column": format!("c{c}"), "count": r * 10 + c})
                            .as_object()
                            .cloned()
                            .unwrap()
                    })
                    .collect();
                Row::new(fields, bins)
            })
            .collect();
        Rc::new(Dataset::new(rows))
    }

    fn config() -> HeatmapConfig {
        HeatmapConfig {
            tile_size: 10.0,
            ..HeatmapConfig::default()
        }
    }

    fn recording_controller(ds: Rc<Dataset>) -> (GridHoverController, Rc<RefCell<Vec<HoverEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let controller =
            GridHoverController::new(config(), ds, move |e: HoverEvent| sink.borrow_mut().push(e))
                .unwrap();
        (controller, events)
    }

    #[test]
    fn test_payload_carries_labels() {
        let (mut controller, events) = recording_controller(dataset(2, 3));
        let channel = PointerChannel::new();
        controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 30.0, 20.0));

        channel.emit(PointerPosition::new(25.0, 15.0));
        let events = events.borrow();
        let HoverEvent::HoverChanged(payload) = &events[0] else {
            panic!("expected hover_changed, got {:?}", events[0]);
        };
        assert_eq!((payload.row, payload.column), (1, 2));
        assert_eq!(payload.row_label, "r1");
        assert_eq!(payload.column_label, "c2");
        assert_eq!(payload.record["count"], json!(12));
    }

    #[test]
    fn test_one_event_per_transition() {
        let (mut controller, events) = recording_controller(dataset(2, 3));
        let channel = PointerChannel::new();
        controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 30.0, 20.0));

        channel.emit(PointerPosition::new(1.0, 1.0));
        channel.emit(PointerPosition::new(2.0, 2.0));
        channel.emit(PointerPosition::new(50.0, 2.0));
        channel.emit(PointerPosition::new(60.0, 2.0));

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], HoverEvent::HoverChanged(_)));
        assert_eq!(events[1], HoverEvent::HoverEnded);
    }

    #[test]
    fn test_short_row_gap_is_outside() {
        let mut rows = dataset(2, 3).rows().to_vec();
        rows[0].bins.truncate(1);
        let (mut controller, events) = recording_controller(Rc::new(Dataset::new(rows)));
        let channel = PointerChannel::new();
        controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 30.0, 20.0));

        channel.emit(PointerPosition::new(25.0, 5.0));
        assert_eq!(controller.state(), HoverState::Idle);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_unmounted_bounds_ignore_updates() {
        let (mut controller, events) = recording_controller(dataset(2, 3));
        let channel = PointerChannel::new();
        controller.attach(&channel, || None::<GridBounds>);
        channel.emit(PointerPosition::new(5.0, 5.0));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_tile_size_change_keeps_hover() {
        let (mut controller, events) = recording_controller(dataset(2, 3));
        let channel = PointerChannel::new();
        controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 60.0, 40.0));

        channel.emit(PointerPosition::new(5.0, 5.0));
        controller.set_tile_size(20.0).unwrap();
        channel.emit(PointerPosition::new(15.0, 15.0));
        assert_eq!(controller.state(), HoverState::Hovering(BinIdentity::new(0, 0)));
        assert_eq!(events.borrow().len(), 1);
        assert!(controller.set_tile_size(0.0).is_err());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = HeatmapConfig {
            tile_size: -1.0,
            ..HeatmapConfig::default()
        };
        assert!(GridHoverController::new(bad, dataset(1, 1), |_: HoverEvent| {}).is_err());
    }

    #[test]
    fn test_unregister_active_emits_hover_ended() {
        let (mut controller, events) = recording_controller(dataset(2, 3));
        let channel = PointerChannel::new();
        controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 30.0, 20.0));
        let id = BinIdentity::new(0, 0);
        controller.register(id, HoverCallbacks::new(|| {}, || {}));

        channel.emit(PointerPosition::new(5.0, 5.0));
        controller.unregister(id);
        assert_eq!(controller.state(), HoverState::Idle);
        assert_eq!(events.borrow().last(), Some(&HoverEvent::HoverEnded));
    }

    #[test]
    fn test_drop_releases_subscription() {
        let channel = PointerChannel::new();
        {
            let (mut controller, _events) = recording_controller(dataset(1, 1));
            controller.attach(&channel, GridBounds::from_origin(0.0, 0.0, 10.0, 10.0));
            assert_eq!(channel.subscriber_count(), 1);
        }
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_hover_event_json() {
        let json = serde_json::to_value(HoverEvent::HoverEnded).unwrap();
        assert_eq!(json, json!({"event": "hover_ended"}));
    }
}
