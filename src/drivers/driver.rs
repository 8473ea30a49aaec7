//! # The opaque external-operation boundary.
//!
//! A [`Driver`] is what a managed unit drives: a pair of asynchronous
//! operations that start and stop the real thing behind the unit (a server
//! process, a hosted data service). The unit never inspects what the
//! operations actually do; it only observes their outcome and translates
//! it into lifecycle state.
//!
//! The common handle type is [`DriverRef`], an `Arc<dyn Driver>` suitable
//! for sharing with the runtime.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ServiceError;

/// Asynchronous start/stop operations for one managed unit.
///
/// Both operations run to a terminal outcome once begun; there is no
/// mid-flight cancellation. The unit owning the driver guarantees at most
/// one operation is in flight at a time.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servisor::{Driver, ServiceError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Driver for Noop {
///     async fn begin_start(&self) -> Result<(), ServiceError> {
///         Ok(())
///     }
///
///     async fn begin_stop(&self) -> Result<(), ServiceError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Brings the external resource up. Resolves `Ok` once the resource is
    /// ready for use, or `Err` if it could not come up.
    async fn begin_start(&self) -> Result<(), ServiceError>;

    /// Tears the external resource down. Expected to succeed eventually;
    /// an `Err` outcome is still treated as terminal for the session.
    async fn begin_stop(&self) -> Result<(), ServiceError>;
}

/// Shared handle to a driver.
pub type DriverRef = Arc<dyn Driver>;
