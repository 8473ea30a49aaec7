//! Error types used by the orchestrator runtime and managed units.
//!
//! This module defines two error enums:
//!
//! - [`ServiceError`] — errors raised by one unit's start/stop operation.
//! - [`OrchestratorError`] — errors raised by the orchestration layer
//!   itself (builder wiring, shutdown sequencing).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging and metrics.
//!
//! Failures never cross the synchronous `start()`/`stop()` call boundary:
//! a [`ServiceError`] surfaces only through the unit's `Failed` status
//! event and its `last_error` field.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a unit's start or stop operation.
///
/// Stored in the unit's `last_error` when it enters `Failed`, and attached
/// as text to the corresponding status event. None of these are retried
/// automatically; a fresh `start()` is required after a failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// The start operation resolved to an error (process could not launch,
    /// port in use, malformed service definition, ...).
    #[error("startup failed: {reason}")]
    Startup {
        /// Human-readable failure description.
        reason: String,
    },

    /// The stop operation resolved to an error. Still terminal for the
    /// session so the orchestrator's shutdown sequence can proceed.
    #[error("shutdown failed: {reason}")]
    Shutdown {
        /// Human-readable failure description.
        reason: String,
    },

    /// The operation exceeded its configured timeout.
    #[error("operation timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The driver future panicked; the panic was caught and converted.
    #[error("driver panicked: {reason}")]
    Panicked {
        /// Panic payload, when printable.
        reason: String,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::ServiceError;
    ///
    /// let err = ServiceError::Startup { reason: "port 50000 in use".into() };
    /// assert_eq!(err.as_label(), "service_startup_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Startup { .. } => "service_startup_failed",
            ServiceError::Shutdown { .. } => "service_shutdown_failed",
            ServiceError::Timeout { .. } => "service_timeout",
            ServiceError::Panicked { .. } => "service_driver_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::Startup { reason } => format!("startup: {reason}"),
            ServiceError::Shutdown { reason } => format!("shutdown: {reason}"),
            ServiceError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            ServiceError::Panicked { reason } => format!("panic: {reason}"),
        }
    }
}

/// # Errors produced by the orchestration layer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The builder was finalized without a server specification.
    #[error("orchestrator requires a server specification")]
    ServerMissing,

    /// A dependent was registered against a unit id that does not exist.
    #[error("unit {unit:?} depends on unknown unit {dependency:?}")]
    UnknownDependency {
        /// The dependent unit's id.
        unit: String,
        /// The id it was wired against.
        dependency: String,
    },

    /// The shutdown grace period elapsed before one or more units reached
    /// a stop-terminal state. The sequence still ran to completion; the
    /// listed units were left mid-stop.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured per-unit grace duration.
        grace: Duration,
        /// Ids of units that did not reach a stop-terminal state in time.
        stuck: Vec<String>,
    },
}

impl OrchestratorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::OrchestratorError;
    /// use std::time::Duration;
    ///
    /// let err = OrchestratorError::GraceExceeded {
    ///     grace: Duration::from_secs(5),
    ///     stuck: vec![],
    /// };
    /// assert_eq!(err.as_label(), "orchestrator_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorError::ServerMissing => "orchestrator_server_missing",
            OrchestratorError::UnknownDependency { .. } => "orchestrator_unknown_dependency",
            OrchestratorError::GraceExceeded { .. } => "orchestrator_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OrchestratorError::ServerMissing => "no server specification".to_string(),
            OrchestratorError::UnknownDependency { unit, dependency } => {
                format!("unit {unit} wired against unknown unit {dependency}")
            }
            OrchestratorError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck units={stuck:?}")
            }
        }
    }
}
