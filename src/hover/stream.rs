//! Pointer-position sources and subscription handles.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::types::PointerPosition;

/// Callback invoked for every pointer update.
pub type PointerHandler = Box<dyn FnMut(PointerPosition)>;

/// A stream of pointer positions in viewport pixels.
pub trait PointerSource {
    /// Start delivering updates to `handler` until the returned
    /// [`Subscription`] is released.
    fn subscribe(&self, handler: PointerHandler) -> Subscription;
}

/// Owned handle to a pointer subscription.
///
/// Releasing is idempotent and also happens on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

type SharedHandler = Rc<RefCell<PointerHandler>>;

#[derive(Default)]
struct ChannelState {
    next_id: u64,
    handlers: Vec<(u64, SharedHandler)>,
    queue: VecDeque<PointerPosition>,
    delivering: bool,
}

impl ChannelState {
    fn handler(&self, id: u64) -> Option<SharedHandler> {
        self.handlers
            .iter()
            .find(|(hid, _)| *hid == id)
            .map(|(_, h)| Rc::clone(h))
    }
}

/// In-process pointer source.
///
/// Updates are queued with [`push`](Self::push) and delivered in order by
/// [`flush`](Self::flush); [`emit`](Self::emit) does both. Delivery is
/// serialized: an update pushed from inside a handler is delivered after
/// the current one finishes.
#[derive(Clone, Default)]
pub struct PointerChannel {
    state: Rc<RefCell<ChannelState>>,
}

impl PointerChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Queue an update without delivering it.
    pub fn push(&self, position: PointerPosition) {
        self.state.borrow_mut().queue.push_back(position);
    }

    /// Queue and deliver an update.
    pub fn emit(&self, position: PointerPosition) {
        self.push(position);
        self.flush();
    }

    /// Deliver every queued update to the current subscribers.
    pub fn flush(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }

        loop {
            let (position, ids) = {
                let mut state = self.state.borrow_mut();
                let Some(position) = state.queue.pop_front() else {
                    state.delivering = false;
                    break;
                };
                let ids: Vec<u64> = state.handlers.iter().map(|(id, _)| *id).collect();
                (position, ids)
            };

            for id in ids {
                // Re-check each time: an earlier handler may have unsubscribed this one
                let Some(handler) = self.state.borrow().handler(id) else {
                    continue;
                };
                let Ok(mut handler) = handler.try_borrow_mut() else {
                    continue;
                };
                (*handler)(position);
            }
        }
    }
}

impl PointerSource for PointerChannel {
    fn subscribe(&self, handler: PointerHandler) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.push((id, Rc::new(RefCell::new(handler))));
            id
        };

        let weak: Weak<RefCell<ChannelState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().handlers.retain(|(hid, _)| *hid != id);
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;

    fn recorder(channel: &PointerChannel) -> (Rc<RefCell<Vec<f64>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = channel.subscribe(Box::new(move |p: PointerPosition| {
            sink.borrow_mut().push(p.x);
        }));
        (seen, sub)
    }

    #[test]
    fn test_delivers_in_order() {
        let channel = PointerChannel::new();
        let (seen, _sub) = recorder(&channel);
        channel.push(PointerPosition::new(1.0, 0.0));
        channel.push(PointerPosition::new(2.0, 0.0));
        assert!(seen.borrow().is_empty());
        channel.flush();
        assert_eq!(*seen.borrow(), vec![1.0, 2.0]);
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let channel = PointerChannel::new();
        let (seen, mut sub) = recorder(&channel);
        assert_eq!(channel.subscriber_count(), 1);
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(channel.subscriber_count(), 0);
        channel.emit(PointerPosition::new(1.0, 0.0));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel = PointerChannel::new();
        {
            let (_seen, _sub) = recorder(&channel);
            assert_eq!(channel.subscriber_count(), 1);
        }
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_channel() {
        let channel = PointerChannel::new();
        let (_seen, mut sub) = recorder(&channel);
        drop(channel);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_reentrant_emit_is_serialized() {
        let channel = PointerChannel::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&order);
        let inner = channel.clone();
        let _sub = channel.subscribe(Box::new(move |p: PointerPosition| {
            sink.borrow_mut().push(format!("start {}", p.x));
            if p.x < 1.0 {
                inner.emit(PointerPosition::new(1.0, 0.0));
            }
            sink.borrow_mut().push(format!("end {}", p.x));
        }));
        channel.emit(PointerPosition::new(0.0, 0.0));
        assert_eq!(*order.borrow(), vec!["start 0", "end 0", "start 1", "end 1"]);
    }
}
