//! # Per-unit subscription registry with synchronous in-order dispatch.
//!
//! Each managed unit owns one [`ListenerSet`]. Callbacks registered through
//! `subscribe()` are invoked synchronously, in subscription order, for every
//! subsequent event of that unit — delivery completes before the transition
//! call returns control to the scheduler.
//!
//! ## Rules
//! - Dispatch iterates a snapshot taken at transition time; the iteration
//!   order is stable for a given call.
//! - A panicking callback is caught and reported; remaining callbacks still
//!   receive the event.
//! - Subscribing does not replay past events. A listener added after
//!   `Started` has already been delivered will not see that transition and
//!   must query current state separately if it needs it.
//!
//! ```text
//!    transition ──► snapshot(listeners) ──► cb1 ──► cb2 ──► ... ──► cbN
//!                                            └─ panic caught, logged ─┘
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::events::StatusEvent;

/// Callback signature for status listeners.
pub(crate) type ListenerFn = dyn Fn(&StatusEvent) + Send + Sync;

/// Handle returned by `subscribe()`, usable to unsubscribe.
///
/// Dropping the handle does **not** unsubscribe; removal is explicit via
/// `unsubscribe()` on the unit (or handle) the subscription came from.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "keep the handle to unsubscribe later"]
pub struct Subscription {
    pub(crate) id: u64,
}

struct Entry {
    id: u64,
    callback: Arc<ListenerFn>,
}

/// Ordered registry of listener callbacks for one unit.
pub(crate) struct ListenerSet {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a callback; it will be invoked for every subsequent event.
    pub(crate) fn insert(&mut self, callback: Arc<ListenerFn>) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, callback });
        Subscription { id }
    }

    /// Removes the callback behind `subscription`. Returns `false` when the
    /// subscription was already removed.
    pub(crate) fn remove(&mut self, subscription: &Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != subscription.id);
        self.entries.len() != before
    }

    /// Snapshot of the current callbacks in subscription order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<ListenerFn>> {
        self.entries.iter().map(|e| Arc::clone(&e.callback)).collect()
    }
}

/// Delivers one event to a listener snapshot, sequentially and in order.
///
/// Panics inside a callback are caught so that later callbacks (and the
/// transition that triggered delivery) are unaffected.
pub(crate) fn dispatch(listeners: &[Arc<ListenerFn>], event: &StatusEvent) {
    for callback in listeners {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
            tracing::error!(
                unit = %event.unit,
                state = %event.current,
                "status listener panicked: {}",
                panic_message(&panic)
            );
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceState;
    use std::sync::Mutex;

    fn event() -> StatusEvent {
        StatusEvent::transition("u", ServiceState::NotStarted, ServiceState::Starting)
    }

    #[test]
    fn test_dispatch_preserves_subscription_order() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut set = ListenerSet::new();

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            let _sub = set.insert(Arc::new(move |_ev: &StatusEvent| {
                seen.lock().expect("poisoned").push(tag);
            }));
        }

        dispatch(&set.snapshot(), &event());
        assert_eq!(*seen.lock().expect("poisoned"), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let mut set = ListenerSet::new();
        let a = set.insert(Arc::new(|_ev: &StatusEvent| {}));
        let b = set.insert(Arc::new(|_ev: &StatusEvent| {}));

        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert_eq!(set.snapshot().len(), 1);
        assert!(set.remove(&b));
    }

    #[test]
    fn test_panicking_listener_does_not_block_later_ones() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut set = ListenerSet::new();

        let _panicky = set.insert(Arc::new(|_ev: &StatusEvent| panic!("boom")));
        let tail = Arc::clone(&seen);
        let _sub = set.insert(Arc::new(move |_ev: &StatusEvent| {
            tail.lock().expect("poisoned").push("after-panic");
        }));

        dispatch(&set.snapshot(), &event());
        assert_eq!(*seen.lock().expect("poisoned"), vec!["after-panic"]);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("literal");
        assert_eq!(panic_message(payload.as_ref()), "literal");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }
}
