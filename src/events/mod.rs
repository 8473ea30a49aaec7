//! # Status events: data model and per-unit delivery.
//!
//! This module groups the event **data model** and the **listener
//! registry** used to deliver lifecycle transitions to subscribers.
//!
//! ## Contents
//! - [`StatusEvent`] transition record with global sequence numbers
//! - [`Subscription`] handle returned by `subscribe()`
//! - `ListenerSet` (crate-internal) per-unit registry with synchronous,
//!   subscription-ordered dispatch and panic isolation
//!
//! Delivery is synchronous by contract: a transition's event reaches every
//! current subscriber before the transition call returns. There is no
//! broadcast channel in between — ordering is the point.

pub(crate) mod listeners;

mod event;

pub use event::StatusEvent;
pub use listeners::Subscription;
