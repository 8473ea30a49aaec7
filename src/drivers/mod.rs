//! # Drivers: the opaque operations behind a managed unit.
//!
//! This module provides the driver types:
//! - [`Driver`] - trait pairing the asynchronous `begin_start`/`begin_stop`
//!   operations the environment supplies
//! - [`DriverFn`] - closure-backed driver implementation
//! - [`DriverRef`] - shared reference to a driver (`Arc<dyn Driver>`)
//! - [`ProcessDriver`] - child-process driver with readiness probing
//!   (`process` feature)

mod driver;
mod driver_fn;
#[cfg(feature = "process")]
mod process;

pub use driver::{Driver, DriverRef};
pub use driver_fn::DriverFn;
#[cfg(feature = "process")]
pub use process::ProcessDriver;
