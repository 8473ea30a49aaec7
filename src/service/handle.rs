//! # Read-only unit view for collaborators.
//!
//! The orchestrator is the sole owner of start/stop for its units; what it
//! hands out to the rest of the application is a [`StatusHandle`]: state
//! reads and subscriptions, nothing that mutates the lifecycle. Layer
//! creation code reacting to "service ready" needs exactly this surface.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ServiceError;
use crate::events::{StatusEvent, Subscription};
use crate::service::{ManagedUnit, ServiceState};

/// Cloneable, read-only view of one managed unit.
#[derive(Clone)]
pub struct StatusHandle {
    unit: Arc<ManagedUnit>,
}

impl StatusHandle {
    /// Wraps a unit into a read-only view.
    pub fn new(unit: Arc<ManagedUnit>) -> Self {
        Self { unit }
    }

    /// Returns the unit id.
    pub fn id(&self) -> &str {
        self.unit.id()
    }

    /// Returns the unit's current state.
    pub fn current_state(&self) -> ServiceState {
        self.unit.current_state()
    }

    /// Returns the error recorded at the most recent `Failed` entry.
    pub fn last_error(&self) -> Option<ServiceError> {
        self.unit.last_error()
    }

    /// Returns a watch receiver observing state changes.
    pub fn state_watch(&self) -> watch::Receiver<ServiceState> {
        self.unit.state_watch()
    }

    /// Subscribes to subsequent status events of the unit.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.unit.subscribe(callback)
    }

    /// Removes a subscription created through this unit.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.unit.unsubscribe(subscription)
    }
}
