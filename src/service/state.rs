//! # Lifecycle states for managed units.
//!
//! [`ServiceState`] classifies where a unit is in its lifecycle. Transitions
//! follow a fixed set of edges; no edge skips an intermediate state:
//!
//! ```text
//!                ┌──────────► Failed ◄──────────┐
//!                │                              │
//! NotStarted ──► Starting ──► Started ──► Stopping ──► Stopped
//!     ▲                                                   │
//!     └──────────────── (fresh start) ◄───────────────────┘
//! ```
//!
//! A fresh `start()` re-enters `Starting` only from `NotStarted`, `Stopped`
//! or `Failed` (see [`ServiceState::can_begin_start`]).

use std::fmt;

/// Lifecycle state of a managed unit.
///
/// Carried by every [`StatusEvent`](crate::StatusEvent) as the `previous`
/// and `current` fields, and readable at any time through
/// [`ManagedUnit::current_state`](crate::ManagedUnit::current_state).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    /// Unit was never started, or a pending dependency-gated start was
    /// cancelled before it began.
    NotStarted,
    /// The asynchronous start operation is in flight.
    Starting,
    /// The unit is up; dependents gated on this unit may now start.
    Started,
    /// The asynchronous stop operation is in flight.
    Stopping,
    /// The unit stopped cleanly.
    Stopped,
    /// A start or stop operation resolved to an error. Terminal for this
    /// lifecycle; only a fresh `start()` leaves this state.
    Failed,
}

impl ServiceState {
    /// True if a fresh `start()` may transition this state into `Starting`.
    ///
    /// # Example
    /// ```
    /// use servisor::ServiceState;
    ///
    /// assert!(ServiceState::NotStarted.can_begin_start());
    /// assert!(ServiceState::Failed.can_begin_start());
    /// assert!(!ServiceState::Starting.can_begin_start());
    /// assert!(!ServiceState::Stopping.can_begin_start());
    /// ```
    pub fn can_begin_start(self) -> bool {
        matches!(
            self,
            ServiceState::NotStarted | ServiceState::Stopped | ServiceState::Failed
        )
    }

    /// True if a stop sequence has nothing further to wait for: the unit
    /// either never ran, stopped cleanly, or failed terminally.
    pub fn is_stop_terminal(self) -> bool {
        matches!(
            self,
            ServiceState::NotStarted | ServiceState::Stopped | ServiceState::Failed
        )
    }

    /// True while an asynchronous operation is in flight for the unit.
    pub fn is_transitioning(self) -> bool {
        matches!(self, ServiceState::Starting | ServiceState::Stopping)
    }

    /// Returns a short stable label (snake_case) for logs and metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ServiceState::NotStarted => "not_started",
            ServiceState::Starting => "starting",
            ServiceState::Started => "started",
            ServiceState::Stopping => "stopping",
            ServiceState::Stopped => "stopped",
            ServiceState::Failed => "failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_only_from_idle_states() {
        assert!(ServiceState::NotStarted.can_begin_start());
        assert!(ServiceState::Stopped.can_begin_start());
        assert!(ServiceState::Failed.can_begin_start());

        assert!(!ServiceState::Starting.can_begin_start());
        assert!(!ServiceState::Started.can_begin_start());
        assert!(!ServiceState::Stopping.can_begin_start());
    }

    #[test]
    fn test_stop_terminal_states() {
        assert!(ServiceState::NotStarted.is_stop_terminal());
        assert!(ServiceState::Stopped.is_stop_terminal());
        assert!(ServiceState::Failed.is_stop_terminal());

        assert!(!ServiceState::Started.is_stop_terminal());
        assert!(!ServiceState::Starting.is_stop_terminal());
        assert!(!ServiceState::Stopping.is_stop_terminal());
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ServiceState::NotStarted.as_label(), "not_started");
        assert_eq!(ServiceState::Failed.to_string(), "failed");
    }
}
