//! # Closure-backed driver (`DriverFn`)
//!
//! [`DriverFn`] wraps two closures, one per operation, each producing a
//! fresh future per invocation. This avoids shared mutable state in the
//! driver itself; if the start and stop halves need to share state, put it
//! in an `Arc` captured by both closures.
//!
//! ## Example
//! ```
//! use servisor::{DriverFn, DriverRef, ServiceError};
//!
//! let driver: DriverRef = DriverFn::arc(
//!     || async {
//!         // launch the process, poll readiness...
//!         Ok::<_, ServiceError>(())
//!     },
//!     || async {
//!         // ask it to exit...
//!         Ok::<_, ServiceError>(())
//!     },
//! );
//! # let _ = driver;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::drivers::driver::Driver;
use crate::error::ServiceError;

/// Function-backed driver implementation.
///
/// Wraps a start closure and a stop closure that each *create* a new
/// future per call.
pub struct DriverFn<S, T> {
    start: S,
    stop: T,
}

impl<S, T> DriverFn<S, T> {
    /// Creates a new closure-backed driver.
    ///
    /// Prefer [`DriverFn::arc`] when you immediately need a
    /// [`DriverRef`](crate::DriverRef).
    pub fn new(start: S, stop: T) -> Self {
        Self { start, stop }
    }

    /// Creates the driver and returns it as a shared handle.
    pub fn arc(start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(start, stop))
    }
}

#[async_trait]
impl<S, SFut, T, TFut> Driver for DriverFn<S, T>
where
    S: Fn() -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    T: Fn() -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    async fn begin_start(&self) -> Result<(), ServiceError> {
        (self.start)().await
    }

    async fn begin_stop(&self) -> Result<(), ServiceError> {
        (self.stop)().await
    }
}
