//! # Built-in logging listener.
//!
//! [`LogListener`] renders status events through `tracing`, one line per
//! transition, failures at `warn`. Useful for demos and for applications
//! that want lifecycle visibility without writing their own listener.
//!
//! ## Output shape
//! ```text
//! INFO  unit=local-server state=starting previous=not_started
//! INFO  unit=local-server state=started previous=starting
//! WARN  unit=feature-service state=failed previous=starting error="startup failed: ..."
//! ```
//!
//! Attach with [`LogListener::attach`]:
//! ```no_run
//! # use servisor::{LogListener, Orchestrator};
//! # fn wire(orchestrator: &Orchestrator) {
//! let _sub = LogListener::attach(&orchestrator.server());
//! # }
//! ```

use crate::events::{StatusEvent, Subscription};
use crate::service::StatusHandle;

/// Listener that logs every status event of one unit.
pub struct LogListener;

impl LogListener {
    /// Subscribes a logging callback to the given unit.
    pub fn attach(handle: &StatusHandle) -> Subscription {
        handle.subscribe(Self::log)
    }

    /// Renders one event. Public so applications embedding their own
    /// listener can delegate to the standard rendering.
    pub fn log(event: &StatusEvent) {
        match &event.error {
            Some(error) => {
                tracing::warn!(
                    unit = %event.unit,
                    state = %event.current,
                    previous = %event.previous,
                    %error,
                    "unit failed"
                );
            }
            None => {
                tracing::info!(
                    unit = %event.unit,
                    state = %event.current,
                    previous = %event.previous,
                    "unit transition"
                );
            }
        }
    }
}
