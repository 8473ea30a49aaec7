//! # Global orchestrator configuration.
//!
//! [`Config`] centralizes runtime settings. It is used in two ways:
//! 1. **Orchestrator creation**: `Orchestrator::builder(config)`
//! 2. **Spec defaults**: `ServiceSpec::with_defaults(id, driver, &config)`
//!
//! ## Sentinel values
//! - `start_timeout = 0s` → no start timeout (treated as `None`)
//! - `stop_timeout = 0s` → no stop timeout
//! - `grace = 0s` → `stop_all()` requests stops but does not wait

use std::time::Duration;

/// Global configuration for the orchestrator runtime.
///
/// ## Field semantics
/// - `grace`: maximum wait per unit during `stop_all()` before the unit is
///   recorded as stuck and the sequence moves on (`0s` = don't wait)
/// - `start_timeout`: default bound on a unit's start operation
///   (`0s` = unbounded; can be overridden per spec)
/// - `stop_timeout`: default bound on a unit's stop operation
///   (`0s` = unbounded; can be overridden per spec)
/// - `stop_signal_grace`: how long `ProcessDriver` waits after SIGTERM
///   before escalating to a hard kill
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time `stop_all()` waits for one unit to reach a
    /// stop-terminal state before recording it as stuck and moving on.
    pub grace: Duration,

    /// Default per-unit start timeout. `Duration::ZERO` means no timeout.
    pub start_timeout: Duration,

    /// Default per-unit stop timeout. `Duration::ZERO` means no timeout.
    pub stop_timeout: Duration,

    /// Grace between SIGTERM and hard kill for process-backed drivers.
    pub stop_signal_grace: Duration,
}

impl Config {
    /// Returns the default start timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → the start operation is bounded by `d`
    #[inline]
    pub fn default_start_timeout(&self) -> Option<Duration> {
        if self.start_timeout == Duration::ZERO {
            None
        } else {
            Some(self.start_timeout)
        }
    }

    /// Returns the default stop timeout as an `Option`.
    #[inline]
    pub fn default_stop_timeout(&self) -> Option<Duration> {
        if self.stop_timeout == Duration::ZERO {
            None
        } else {
            Some(self.stop_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s` (shutdown window per unit)
    /// - `start_timeout = 0s` (no bound; local server boots vary widely)
    /// - `stop_timeout = 0s` (no bound)
    /// - `stop_signal_grace = 5s` (SIGTERM before kill)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            start_timeout: Duration::ZERO,
            stop_timeout: Duration::ZERO,
            stop_signal_grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeouts_mean_none() {
        let cfg = Config::default();
        assert!(cfg.default_start_timeout().is_none());
        assert!(cfg.default_stop_timeout().is_none());
    }

    #[test]
    fn test_nonzero_timeouts_pass_through() {
        let cfg = Config {
            start_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(3),
            ..Config::default()
        };
        assert_eq!(cfg.default_start_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.default_stop_timeout(), Some(Duration::from_secs(3)));
    }
}
