//! # Built-in status listeners.
//!
//! Subscribers plug into a unit's event stream through
//! [`StatusHandle::subscribe`](crate::StatusHandle::subscribe); anything
//! callable as `Fn(&StatusEvent)` works. This module ships the one
//! implementation most applications want out of the box:
//!
//! - [`LogListener`] - renders transitions through `tracing`

mod log;

pub use log::LogListener;
