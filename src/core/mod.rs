//! Runtime core: orchestration and lifecycle sequencing.
//!
//! The public API from this module is [`Orchestrator`] (and its builder),
//! which owns the server unit and its dependents, sequences startup, and
//! reverses the sequence on shutdown.
//!
//! Internal modules:
//! - [`orchestrator`]: ownership, start/stop sequencing, grace handling;
//! - [`shutdown`]: cross-platform termination-signal helper.

mod orchestrator;
mod shutdown;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
