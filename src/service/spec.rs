//! # Service specification for managed execution.
//!
//! Defines [`ServiceSpec`], a configuration bundle describing one unit:
//! its stable id, its [`Driver`](crate::Driver), and optional bounds on the
//! start/stop operations.
//!
//! A spec can be created:
//! - **Explicitly** with [`ServiceSpec::new`] (no timeouts)
//! - **From config** with [`ServiceSpec::with_defaults`] (inherit timeouts)

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::drivers::DriverRef;

/// Specification for one managed unit.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use servisor::{Config, DriverFn, DriverRef, ServiceError, ServiceSpec};
///
/// let driver: DriverRef = DriverFn::arc(
///     || async { Ok::<_, ServiceError>(()) },
///     || async { Ok::<_, ServiceError>(()) },
/// );
///
/// // Explicit configuration:
/// let spec = ServiceSpec::new("local-server", driver.clone())
///     .with_start_timeout(Some(Duration::from_secs(30)));
/// assert_eq!(spec.id(), "local-server");
/// assert!(spec.stop_timeout().is_none());
///
/// // Inherit from global config (`0s` in config is treated as `None`):
/// let cfg = Config::default();
/// let spec2 = ServiceSpec::with_defaults("feature-service", driver, &cfg);
/// assert!(spec2.start_timeout().is_none());
/// ```
#[derive(Clone)]
pub struct ServiceSpec {
    id: Arc<str>,
    driver: DriverRef,
    start_timeout: Option<Duration>,
    stop_timeout: Option<Duration>,
}

impl ServiceSpec {
    /// Creates a new specification with no operation timeouts.
    pub fn new(id: impl Into<Arc<str>>, driver: DriverRef) -> Self {
        Self {
            id: id.into(),
            driver,
            start_timeout: None,
            stop_timeout: None,
        }
    }

    /// Creates a specification inheriting timeouts from global config.
    pub fn with_defaults(id: impl Into<Arc<str>>, driver: DriverRef, cfg: &Config) -> Self {
        Self {
            id: id.into(),
            driver,
            start_timeout: cfg.default_start_timeout(),
            stop_timeout: cfg.default_stop_timeout(),
        }
    }

    /// Returns the unit id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the driver handle.
    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    /// Returns the start timeout, if configured.
    pub fn start_timeout(&self) -> Option<Duration> {
        self.start_timeout
    }

    /// Returns the stop timeout, if configured.
    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout
    }

    /// Returns a new spec with an updated start timeout.
    pub fn with_start_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Returns a new spec with an updated stop timeout.
    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub(crate) fn into_parts(self) -> (Arc<str>, DriverRef, Option<Duration>, Option<Duration>) {
        (self.id, self.driver, self.start_timeout, self.stop_timeout)
    }
}
