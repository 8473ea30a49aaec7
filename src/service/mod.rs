//! # Managed units and their specifications.
//!
//! This module provides the unit-related types:
//! - [`ServiceState`] - lifecycle states and legal edges
//! - [`ServiceSpec`] - specification bundling id, driver and timeouts
//! - [`ManagedUnit`] - the state machine (dependency gating, event
//!   emission, pending/deferred bookkeeping)
//! - [`StatusHandle`] - read-only view handed to collaborators

mod handle;
mod spec;
mod state;
mod unit;

pub use handle::StatusHandle;
pub use spec::ServiceSpec;
pub use state::ServiceState;
pub use unit::ManagedUnit;
