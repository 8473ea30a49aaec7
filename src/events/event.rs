//! # Status events emitted on every lifecycle transition.
//!
//! A [`StatusEvent`] is an immutable record of one state change for one
//! managed unit. It is created exactly once per transition, delivered
//! synchronously to the unit's subscribers, and then dropped; the core
//! keeps no event log.
//!
//! ## Ordering guarantees
//! Each event carries a globally unique sequence number (`seq`) that
//! increases monotonically across all units. Within a single unit, events
//! are delivered in transition order; across units, `seq` restores the
//! total order when a collaborator records events from several units into
//! one log.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::service::ServiceState;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Immutable record of one lifecycle transition.
///
/// ## Example
/// ```
/// use servisor::{ServiceState, StatusEvent};
///
/// let ev = StatusEvent::transition("tiles", ServiceState::NotStarted, ServiceState::Starting);
/// assert_eq!(ev.unit.as_ref(), "tiles");
/// assert_eq!(ev.previous, ServiceState::NotStarted);
/// assert_eq!(ev.current, ServiceState::Starting);
/// assert!(ev.error.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct StatusEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp of the transition.
    pub at: SystemTime,
    /// Identifier of the unit that transitioned.
    pub unit: Arc<str>,
    /// State the unit left.
    pub previous: ServiceState,
    /// State the unit entered.
    pub current: ServiceState,
    /// Error text, set only when `current` is [`ServiceState::Failed`].
    pub error: Option<Arc<str>>,
}

impl StatusEvent {
    /// Creates a new transition event with the current timestamp and the
    /// next global sequence number.
    pub fn transition(
        unit: impl Into<Arc<str>>,
        previous: ServiceState,
        current: ServiceState,
    ) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            unit: unit.into(),
            previous,
            current,
            error: None,
        }
    }

    /// Attaches error text (used for `Failed` transitions).
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// True if this event records entry into [`ServiceState::Failed`].
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self.current, ServiceState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = StatusEvent::transition("u", ServiceState::NotStarted, ServiceState::Starting);
        let b = StatusEvent::transition("u", ServiceState::Starting, ServiceState::Started);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_with_error_marks_failure() {
        let ev = StatusEvent::transition("u", ServiceState::Starting, ServiceState::Failed)
            .with_error("port in use");
        assert!(ev.is_failure());
        assert_eq!(ev.error.as_deref(), Some("port in use"));
    }
}
