//! Single-active-highlight state machine.
//!
//! The coordinator holds at most one hovered bin. Moving between bins fires
//! the old bin's leave callback before the new bin's enter callback, so two
//! bins are never highlighted at the same time.
//!
//! State changes and callbacks are split: every mutation updates the state
//! first and stages the callbacks it implies. The public methods run the
//! staged callbacks before returning; the controller instead takes them and
//! runs them once it no longer holds any borrow of its own state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::layout::Resolution;
use crate::types::BinIdentity;

/// Enter/leave callbacks registered for one bin.
pub struct HoverCallbacks {
    on_enter: Box<dyn FnMut()>,
    on_leave: Box<dyn FnMut()>,
}

impl HoverCallbacks {
    pub fn new(on_enter: impl FnMut() + 'static, on_leave: impl FnMut() + 'static) -> Self {
        Self {
            on_enter: Box::new(on_enter),
            on_leave: Box::new(on_leave),
        }
    }
}

impl std::fmt::Debug for HoverCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoverCallbacks").finish_non_exhaustive()
    }
}

type SharedCallbacks = Rc<RefCell<HoverCallbacks>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Enter,
    Leave,
}

/// A bin callback whose state change has already happened.
///
/// Holds its own handle on the callbacks, so a leave staged for a bin that
/// is then unregistered or replaced still reaches the old owner.
#[derive(Debug)]
pub(crate) struct StagedCallback {
    id: BinIdentity,
    phase: Phase,
    callbacks: SharedCallbacks,
}

impl StagedCallback {
    pub(crate) fn run(self) {
        let Ok(mut callbacks) = self.callbacks.try_borrow_mut() else {
            tracing::warn!(bin = %self.id, phase = ?self.phase, "bin callback re-entered itself, skipped");
            return;
        };
        match self.phase {
            Phase::Enter => (callbacks.on_enter)(),
            Phase::Leave => (callbacks.on_leave)(),
        }
    }
}

/// Hover state: nothing hovered, or exactly one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering(BinIdentity),
}

impl HoverState {
    pub fn active(self) -> Option<BinIdentity> {
        match self {
            Self::Idle => None,
            Self::Hovering(id) => Some(id),
        }
    }
}

/// What a state change did, so callers can emit matching events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State did not change
    Unchanged,
    /// `Idle -> Hovering(id)`
    Entered(BinIdentity),
    /// `Hovering(from) -> Hovering(to)`
    Switched { from: BinIdentity, to: BinIdentity },
    /// `Hovering(id) -> Idle`
    Left(BinIdentity),
}

impl Transition {
    /// The bin hovered after this transition, if it is newly hovered.
    pub fn entered(self) -> Option<BinIdentity> {
        match self {
            Self::Entered(id) | Self::Switched { to: id, .. } => Some(id),
            Self::Unchanged | Self::Left(_) => None,
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, Self::Left(_))
    }
}

/// Tracks the hovered bin and fires per-bin enter/leave callbacks.
///
/// Identities without a registration still take part in state changes;
/// only their callbacks are skipped.
#[derive(Debug, Default)]
pub struct HoverCoordinator {
    state: HoverState,
    registrations: HashMap<BinIdentity, SharedCallbacks>,
    staged: Vec<StagedCallback>,
    /// Enters staged without a matching leave; never above 1
    #[cfg(debug_assertions)]
    open_enters: usize,
}

impl HoverCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn active(&self) -> Option<BinIdentity> {
        self.state.active()
    }

    pub fn is_registered(&self, id: BinIdentity) -> bool {
        self.registrations.contains_key(&id)
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Register callbacks for `id`, replacing any previous registration.
    ///
    /// If `id` is currently hovered, the replaced callbacks get their leave
    /// and the new ones their enter, keeping the highlight on the new owner.
    pub fn register(&mut self, id: BinIdentity, callbacks: HoverCallbacks) {
        self.stage_register(id, callbacks);
        self.run_staged();
    }

    /// Remove the callbacks for `id`.
    ///
    /// Unregistering the hovered bin fires its leave first and returns the
    /// coordinator to `Idle`. Unknown identities are ignored.
    pub fn unregister(&mut self, id: BinIdentity) -> Transition {
        let transition = self.stage_unregister(id);
        self.run_staged();
        transition
    }

    /// Remove every registration, leaving the hovered bin first.
    pub fn unregister_all(&mut self) -> Transition {
        let transition = self.stage_notify(Resolution::Outside);
        self.registrations.clear();
        self.run_staged();
        transition
    }

    /// Feed one resolved pointer position through the state machine.
    pub fn notify(&mut self, resolution: Resolution) -> Transition {
        let transition = self.stage_notify(resolution);
        self.run_staged();
        transition
    }

    /// Return to `Idle`, firing the hovered bin's leave if there is one.
    pub fn force_idle(&mut self) -> Transition {
        self.notify(Resolution::Outside)
    }

    pub(crate) fn stage_register(&mut self, id: BinIdentity, callbacks: HoverCallbacks) {
        let is_active = self.state == HoverState::Hovering(id);
        if is_active {
            self.stage_leave(id);
        }
        self.registrations
            .insert(id, Rc::new(RefCell::new(callbacks)));
        if is_active {
            self.stage_enter(id);
        }
    }

    pub(crate) fn stage_unregister(&mut self, id: BinIdentity) -> Transition {
        let transition = if self.state == HoverState::Hovering(id) {
            self.stage_leave(id);
            self.state = HoverState::Idle;
            tracing::debug!(bin = %id, "hovered bin unregistered");
            Transition::Left(id)
        } else {
            Transition::Unchanged
        };
        self.registrations.remove(&id);
        transition
    }

    pub(crate) fn stage_notify(&mut self, resolution: Resolution) -> Transition {
        let transition = match (self.state, resolution) {
            (HoverState::Idle, Resolution::Outside) => Transition::Unchanged,
            (HoverState::Idle, Resolution::Bin(id)) => {
                self.state = HoverState::Hovering(id);
                self.stage_enter(id);
                Transition::Entered(id)
            }
            (HoverState::Hovering(a), Resolution::Bin(b)) if a == b => Transition::Unchanged,
            (HoverState::Hovering(a), Resolution::Bin(b)) => {
                self.stage_leave(a);
                self.state = HoverState::Hovering(b);
                self.stage_enter(b);
                Transition::Switched { from: a, to: b }
            }
            (HoverState::Hovering(a), Resolution::Outside) => {
                self.stage_leave(a);
                self.state = HoverState::Idle;
                Transition::Left(a)
            }
        };
        if transition != Transition::Unchanged {
            tracing::debug!(?transition, "hover transition");
        }
        transition
    }

    /// Callbacks staged since the last call, in firing order.
    pub(crate) fn take_staged(&mut self) -> Vec<StagedCallback> {
        std::mem::take(&mut self.staged)
    }

    fn run_staged(&mut self) {
        for callback in self.take_staged() {
            callback.run();
        }
    }

    fn stage_enter(&mut self, id: BinIdentity) {
        if let Some(callbacks) = self.registrations.get(&id) {
            #[cfg(debug_assertions)]
            {
                self.open_enters += 1;
                debug_assert!(
                    self.open_enters <= 1,
                    "bin {id} entered while another bin is still highlighted"
                );
            }
            self.staged.push(StagedCallback {
                id,
                phase: Phase::Enter,
                callbacks: Rc::clone(callbacks),
            });
        }
    }

    fn stage_leave(&mut self, id: BinIdentity) {
        if let Some(callbacks) = self.registrations.get(&id) {
            #[cfg(debug_assertions)]
            {
                debug_assert!(self.open_enters == 1, "bin {id} left without an enter");
                self.open_enters = self.open_enters.saturating_sub(1);
            }
            self.staged.push(StagedCallback {
                id,
                phase: Phase::Leave,
                callbacks: Rc::clone(callbacks),
            });
        }
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
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logging_callbacks(log: &Log, id: BinIdentity) -> HoverCallbacks {
        let enter_log = Rc::clone(log);
        let leave_log = Rc::clone(log);
        HoverCallbacks::new(
            move || enter_log.borrow_mut().push(format!("enter {id}")),
            move || leave_log.borrow_mut().push(format!("leave {id}")),
        )
    }

    fn coordinator_with(log: &Log, ids: &[BinIdentity]) -> HoverCoordinator {
        let mut coordinator = HoverCoordinator::new();
        for &id in ids {
            coordinator.register(id, logging_callbacks(log, id));
        }
        coordinator
    }

    const A: BinIdentity = BinIdentity { row: 0, column: 0 };
    const B: BinIdentity = BinIdentity { row: 0, column: 1 };

    #[test]
    fn test_idle_outside_is_noop() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        assert_eq!(c.notify(Resolution::Outside), Transition::Unchanged);
        assert_eq!(c.state(), HoverState::Idle);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_enter_once_for_repeated_notify() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        assert_eq!(c.notify(Resolution::Bin(A)), Transition::Entered(A));
        assert_eq!(c.notify(Resolution::Bin(A)), Transition::Unchanged);
        assert_eq!(c.notify(Resolution::Bin(A)), Transition::Unchanged);
        assert_eq!(*log.borrow(), vec!["enter 0-0"]);
    }

    #[test]
    fn test_switch_leaves_before_entering() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A, B]);
        c.notify(Resolution::Bin(A));
        assert_eq!(
            c.notify(Resolution::Bin(B)),
            Transition::Switched { from: A, to: B }
        );
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0", "enter 0-1"]);
        assert_eq!(c.active(), Some(B));
    }

    #[test]
    fn test_outside_leaves() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        c.notify(Resolution::Bin(A));
        assert_eq!(c.notify(Resolution::Outside), Transition::Left(A));
        assert_eq!(c.state(), HoverState::Idle);
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0"]);
    }

    #[test]
    fn test_unregistered_identity_tracks_state_silently() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        assert_eq!(c.notify(Resolution::Bin(B)), Transition::Entered(B));
        assert_eq!(
            c.notify(Resolution::Bin(A)),
            Transition::Switched { from: B, to: A }
        );
        assert_eq!(*log.borrow(), vec!["enter 0-0"]);
    }

    #[test]
    fn test_unregister_active_fires_leave() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        c.notify(Resolution::Bin(A));
        assert_eq!(c.unregister(A), Transition::Left(A));
        assert_eq!(c.state(), HoverState::Idle);
        assert!(!c.is_registered(A));
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0"]);

        // Stale identity: no callbacks, no error
        assert_eq!(c.unregister(A), Transition::Unchanged);
        c.notify(Resolution::Bin(A));
        c.notify(Resolution::Outside);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_unregister_inactive_keeps_state() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A, B]);
        c.notify(Resolution::Bin(A));
        assert_eq!(c.unregister(B), Transition::Unchanged);
        assert_eq!(c.active(), Some(A));
    }

    #[test]
    fn test_replacing_active_registration_moves_highlight() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A]);
        c.notify(Resolution::Bin(A));

        let replacement_log = Log::default();
        c.register(A, logging_callbacks(&replacement_log, A));
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0"]);
        assert_eq!(*replacement_log.borrow(), vec!["enter 0-0"]);

        c.notify(Resolution::Outside);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(*replacement_log.borrow(), vec!["enter 0-0", "leave 0-0"]);
    }

    #[test]
    fn test_register_while_hovered_enters() {
        let log = Log::default();
        let mut c = HoverCoordinator::new();
        c.notify(Resolution::Bin(A));
        c.register(A, logging_callbacks(&log, A));
        c.notify(Resolution::Outside);
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0"]);
    }

    #[test]
    fn test_unregister_all() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A, B]);
        c.notify(Resolution::Bin(B));
        assert_eq!(c.unregister_all(), Transition::Left(B));
        assert_eq!(c.registration_count(), 0);
        assert_eq!(*log.borrow(), vec!["enter 0-1", "leave 0-1"]);
    }

    #[test]
    fn test_staged_callbacks_run_when_taken() {
        let log = Log::default();
        let mut c = coordinator_with(&log, &[A, B]);
        c.stage_notify(Resolution::Bin(A));
        c.stage_unregister(A);
        assert_eq!(c.state(), HoverState::Idle);
        assert!(log.borrow().is_empty());

        // The leave still reaches A's callbacks after they were removed
        for callback in c.take_staged() {
            callback.run();
        }
        assert_eq!(*log.borrow(), vec!["enter 0-0", "leave 0-0"]);
        assert!(c.take_staged().is_empty());
    }

    #[test]
    fn test_transition_helpers() {
        assert_eq!(Transition::Entered(A).entered(), Some(A));
        assert_eq!(Transition::Switched { from: A, to: B }.entered(), Some(B));
        assert_eq!(Transition::Left(A).entered(), None);
        assert!(Transition::Left(A).is_left());
    }
}
