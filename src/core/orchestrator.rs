//! # Orchestrator: composes a server with its dependent services.
//!
//! The [`Orchestrator`] owns one server unit and zero or more dependent
//! units in registration order. It sequences startup, reverses the
//! sequence on shutdown, and is the sole component allowed to start or
//! stop its units — collaborators receive [`StatusHandle`]s.
//!
//! ## High-level architecture
//! ```text
//! OrchestratorBuilder::new(cfg)
//!     .server(spec)                  one unit, no dependency
//!     .dependent(spec)               gated on the server
//!     .dependent_on(spec, "other")   gated on an earlier unit
//!     .build()?
//!
//! start_all():
//!   server.start()                 NotStarted ─► Starting ─► Started
//!   dependents[i].start()          each defers internally until its
//!                                  dependency reports Started
//!
//! stop_all():
//!   for unit in dependents.rev():
//!       unit.stop(); wait stop-terminal (≤ grace)  ── stuck? record, move on
//!   server.stop(); wait stop-terminal (≤ grace)
//!   stuck.is_empty() ? Ok : Err(GraceExceeded)
//!
//! run():
//!   start_all() ─► wait_for_shutdown_signal() ─► stop_all()
//! ```
//!
//! ## Rules
//! - Registration order governs the **shutdown** order only; startup has
//!   no barrier between dependents (several may come up concurrently once
//!   the server is ready).
//! - `stop_all()` waits for each dependent's stop-terminal state before
//!   touching the next unit, and only then asks the server to stop: no
//!   dependent is ever left pointing at a server that already tore down.
//! - A stuck unit never blocks the rest of the sequence; it is recorded
//!   and reported through [`OrchestratorError::GraceExceeded`] after the
//!   walk completes.
//! - `start_all()`/`stop_all()` are idempotent per unit.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::config::Config;
use crate::core::shutdown;
use crate::error::OrchestratorError;
use crate::service::{ManagedUnit, ServiceSpec, StatusHandle};

/// Owns and sequences a server unit and its dependents.
///
/// Created once per application session by the composition root and passed
/// by reference; it is deliberately not reachable through any global.
pub struct Orchestrator {
    cfg: Config,
    server: Arc<ManagedUnit>,
    /// Registration order; reversed during shutdown.
    dependents: Vec<Arc<ManagedUnit>>,
}

impl Orchestrator {
    /// Starts building an orchestrator with the given configuration.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    /// Returns a read-only view of the server unit.
    pub fn server(&self) -> StatusHandle {
        StatusHandle::new(Arc::clone(&self.server))
    }

    /// Returns read-only views of the dependents, in registration order.
    pub fn dependents(&self) -> Vec<StatusHandle> {
        self.dependents
            .iter()
            .map(|u| StatusHandle::new(Arc::clone(u)))
            .collect()
    }

    /// Returns a read-only view of one unit by id (server included).
    pub fn unit(&self, id: &str) -> Option<StatusHandle> {
        if self.server.id() == id {
            return Some(StatusHandle::new(Arc::clone(&self.server)));
        }
        self.dependents
            .iter()
            .find(|u| u.id() == id)
            .map(|u| StatusHandle::new(Arc::clone(u)))
    }

    /// Starts the server and every dependent. Never blocks.
    ///
    /// Dependents are started immediately; each defers internally until
    /// its dependency reports `Started`, so no ordering is imposed between
    /// them here.
    pub fn start_all(&self) {
        tracing::info!(server = %self.server.id(), dependents = self.dependents.len(), "starting all units");
        self.server.start();
        for unit in &self.dependents {
            unit.start();
        }
    }

    /// Stops dependents in reverse registration order, each awaited to a
    /// stop-terminal state, then stops the server.
    ///
    /// Per-unit waits are bounded by [`Config::grace`]; units still
    /// mid-stop when the bound elapses are recorded and reported after the
    /// full sequence (server included) has been asked to stop. Safe to
    /// call again, or without a prior `start_all()`.
    pub async fn stop_all(&self) -> Result<(), OrchestratorError> {
        let grace = self.cfg.grace;
        let mut stuck = Vec::new();

        for unit in self.dependents.iter().rev() {
            stop_and_wait(unit, grace, &mut stuck).await;
        }
        stop_and_wait(&self.server, grace, &mut stuck).await;

        if stuck.is_empty() {
            tracing::info!("all units reached a stop-terminal state");
            Ok(())
        } else {
            Err(OrchestratorError::GraceExceeded { grace, stuck })
        }
    }

    /// Convenience loop: start everything, park until a termination
    /// signal arrives, then run the shutdown sequence.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        self.start_all();
        if let Err(err) = shutdown::wait_for_shutdown_signal().await {
            tracing::error!(error = %err, "signal listener failed; shutting down");
        }
        tracing::info!("shutdown signal received");
        self.stop_all().await
    }
}

/// Requests a stop and waits (bounded) for a stop-terminal state.
async fn stop_and_wait(unit: &Arc<ManagedUnit>, grace: Duration, stuck: &mut Vec<String>) {
    let mut rx = unit.state_watch();
    unit.stop();

    match time::timeout(grace, rx.wait_for(|s| s.is_stop_terminal())).await {
        Ok(Ok(_state)) => {}
        Ok(Err(_)) | Err(_) => {
            tracing::warn!(unit = %unit.id(), ?grace, "unit did not reach a stop-terminal state in time");
            stuck.push(unit.id().to_string());
        }
    };
}

/// Builder for wiring a server and its dependents.
///
/// ## Example
/// ```no_run
/// use servisor::{Config, Orchestrator, ServiceSpec};
///
/// # fn specs() -> (ServiceSpec, ServiceSpec) { unimplemented!() }
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let (server_spec, feature_spec) = specs();
///
/// let orchestrator = Orchestrator::builder(Config::default())
///     .server(server_spec)
///     .dependent(feature_spec)
///     .build()?;
///
/// orchestrator.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct OrchestratorBuilder {
    cfg: Config,
    server: Option<ServiceSpec>,
    dependents: Vec<(ServiceSpec, Option<String>)>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            server: None,
            dependents: Vec::new(),
        }
    }

    /// Sets the server specification. Exactly one server is required.
    pub fn server(mut self, spec: ServiceSpec) -> Self {
        self.server = Some(spec);
        self
    }

    /// Registers a dependent gated on the server.
    ///
    /// Registration order is the reverse of shutdown order.
    pub fn dependent(mut self, spec: ServiceSpec) -> Self {
        self.dependents.push((spec, None));
        self
    }

    /// Registers a dependent gated on an earlier-registered unit
    /// (the server or another dependent).
    pub fn dependent_on(mut self, spec: ServiceSpec, dependency_id: impl Into<String>) -> Self {
        self.dependents.push((spec, Some(dependency_id.into())));
        self
    }

    /// Builds the orchestrator, wiring each dependent to its dependency.
    ///
    /// Fails with [`OrchestratorError::ServerMissing`] when no server was
    /// set, or [`OrchestratorError::UnknownDependency`] when a dependent
    /// references an id that was not registered before it.
    pub fn build(self) -> Result<Orchestrator, OrchestratorError> {
        let server_spec = self.server.ok_or(OrchestratorError::ServerMissing)?;
        let server = ManagedUnit::new(server_spec);

        let mut dependents: Vec<Arc<ManagedUnit>> = Vec::with_capacity(self.dependents.len());
        for (spec, dependency_id) in self.dependents {
            let dependency = match &dependency_id {
                None => Arc::clone(&server),
                Some(id) if server.id() == id.as_str() => Arc::clone(&server),
                Some(id) => {
                    let found = dependents.iter().find(|u| u.id() == id.as_str());
                    match found {
                        Some(unit) => Arc::clone(unit),
                        None => {
                            return Err(OrchestratorError::UnknownDependency {
                                unit: spec.id().to_string(),
                                dependency: id.clone(),
                            });
                        }
                    }
                }
            };
            dependents.push(ManagedUnit::with_dependency(spec, &dependency));
        }

        Ok(Orchestrator {
            cfg: self.cfg,
            server,
            dependents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DriverFn, DriverRef};
    use crate::error::ServiceError;
    use crate::service::ServiceState;
    use std::sync::Mutex as StdMutex;

    type Log = Arc<StdMutex<Vec<String>>>;

    fn instant_driver() -> DriverRef {
        DriverFn::arc(
            || async { Ok::<(), ServiceError>(()) },
            || async { Ok::<(), ServiceError>(()) },
        )
    }

    fn timed_driver(start_ms: u64, stop_ms: u64) -> DriverRef {
        DriverFn::arc(
            move || async move {
                time::sleep(Duration::from_millis(start_ms)).await;
                Ok::<(), ServiceError>(())
            },
            move || async move {
                time::sleep(Duration::from_millis(stop_ms)).await;
                Ok::<(), ServiceError>(())
            },
        )
    }

    fn failing_start_driver() -> DriverRef {
        DriverFn::arc(
            || async {
                time::sleep(Duration::from_millis(10)).await;
                Err(ServiceError::Startup {
                    reason: "executable missing".into(),
                })
            },
            || async { Ok::<(), ServiceError>(()) },
        )
    }

    fn hung_stop_driver() -> DriverRef {
        DriverFn::arc(
            || async { Ok::<(), ServiceError>(()) },
            || async { std::future::pending::<Result<(), ServiceError>>().await },
        )
    }

    fn record(handle: &StatusHandle, log: &Log) {
        let log = Arc::clone(log);
        let _sub = handle.subscribe(move |ev| {
            log.lock().expect("poisoned").push(format!("{}:{}", ev.unit, ev.current));
        });
    }

    fn record_all(orch: &Orchestrator, log: &Log) {
        record(&orch.server(), log);
        for handle in orch.dependents() {
            record(&handle, log);
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().expect("poisoned").clone()
    }

    async fn wait_state(handle: &StatusHandle, state: ServiceState) {
        let mut rx = handle.state_watch();
        rx.wait_for(|s| *s == state).await.expect("unit dropped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_order_server_then_dependent() {
        // Server resolves Started after 10ms; the dependent then takes
        // 5ms more. Subscribers must see the four events in order.
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", timed_driver(10, 1)))
            .dependent(ServiceSpec::new("feature", timed_driver(5, 1)))
            .build()
            .expect("valid wiring");
        let log: Log = Log::default();
        record_all(&orch, &log);

        orch.start_all();
        wait_state(&orch.dependents()[0], ServiceState::Started).await;

        assert_eq!(
            entries(&log),
            vec![
                "server:starting",
                "server:started",
                "feature:starting",
                "feature:started",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_failure_leaves_dependent_untouched() {
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", failing_start_driver()))
            .dependent(ServiceSpec::new("feature", instant_driver()))
            .build()
            .expect("valid wiring");
        let log: Log = Log::default();
        record_all(&orch, &log);

        orch.start_all();
        wait_state(&orch.server(), ServiceState::Failed).await;
        time::sleep(Duration::from_millis(50)).await;

        let feature = &orch.dependents()[0];
        assert_eq!(feature.current_state(), ServiceState::NotStarted);
        assert!(feature.last_error().is_none());
        assert_eq!(entries(&log), vec!["server:starting", "server:failed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reverses_registration_order() {
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", timed_driver(2, 2)))
            .dependent(ServiceSpec::new("alpha", timed_driver(2, 2)))
            .dependent(ServiceSpec::new("bravo", timed_driver(2, 2)))
            .build()
            .expect("valid wiring");
        let log: Log = Log::default();
        record_all(&orch, &log);

        orch.start_all();
        for handle in orch.dependents() {
            wait_state(&handle, ServiceState::Started).await;
        }
        log.lock().expect("poisoned").clear();

        orch.stop_all().await.expect("clean shutdown");

        // Full bravo stop before alpha's, server strictly last.
        assert_eq!(
            entries(&log),
            vec![
                "bravo:stopping",
                "bravo:stopped",
                "alpha:stopping",
                "alpha:stopped",
                "server:stopping",
                "server:stopped",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_without_start_is_a_no_op() {
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", instant_driver()))
            .dependent(ServiceSpec::new("feature", instant_driver()))
            .build()
            .expect("valid wiring");
        let log: Log = Log::default();
        record_all(&orch, &log);

        orch.stop_all().await.expect("nothing to stop");
        assert!(entries(&log).is_empty());
        assert_eq!(orch.server().current_state(), ServiceState::NotStarted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_is_idempotent() {
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", instant_driver()))
            .dependent(ServiceSpec::new("feature", instant_driver()))
            .build()
            .expect("valid wiring");

        orch.start_all();
        wait_state(&orch.dependents()[0], ServiceState::Started).await;

        orch.stop_all().await.expect("first shutdown");
        let log: Log = Log::default();
        record_all(&orch, &log);
        orch.stop_all().await.expect("second shutdown");

        assert!(entries(&log).is_empty(), "repeat stop_all emits nothing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_still_stops_the_server() {
        let cfg = Config {
            grace: Duration::from_millis(50),
            ..Config::default()
        };
        let orch = Orchestrator::builder(cfg)
            .server(ServiceSpec::new("server", instant_driver()))
            .dependent(ServiceSpec::new("hung", hung_stop_driver()))
            .build()
            .expect("valid wiring");

        orch.start_all();
        wait_state(&orch.dependents()[0], ServiceState::Started).await;

        let err = orch.stop_all().await.expect_err("hung dependent");
        match err {
            OrchestratorError::GraceExceeded { stuck, .. } => {
                assert_eq!(stuck, vec!["hung".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The walk continued past the stuck unit.
        assert_eq!(orch.server().current_state(), ServiceState::Stopped);
        assert_eq!(
            orch.dependents()[0].current_state(),
            ServiceState::Stopping
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_chained_dependents_start_and_stop_in_order() {
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", timed_driver(2, 2)))
            .dependent(ServiceSpec::new("geodata", timed_driver(2, 2)))
            .dependent_on(ServiceSpec::new("routing", timed_driver(2, 2)), "geodata")
            .build()
            .expect("valid wiring");
        let log: Log = Log::default();
        record_all(&orch, &log);

        orch.start_all();
        wait_state(&orch.unit("routing").expect("registered"), ServiceState::Started).await;

        assert_eq!(
            entries(&log),
            vec![
                "server:starting",
                "server:started",
                "geodata:starting",
                "geodata:started",
                "routing:starting",
                "routing:started",
            ]
        );

        log.lock().expect("poisoned").clear();
        orch.stop_all().await.expect("clean shutdown");
        assert_eq!(
            entries(&log),
            vec![
                "routing:stopping",
                "routing:stopped",
                "geodata:stopping",
                "geodata:stopped",
                "server:stopping",
                "server:stopped",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_converges_while_a_start_is_in_flight() {
        // stop_all() arriving mid-start: the deferred stop drives the unit
        // through Started into Stopping, and the sequence completes.
        let orch = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", timed_driver(20, 1)))
            .build()
            .expect("valid wiring");

        orch.start_all();
        assert_eq!(orch.server().current_state(), ServiceState::Starting);

        orch.stop_all().await.expect("deferred stop converges");
        assert_eq!(orch.server().current_state(), ServiceState::Stopped);
    }

    #[test]
    fn test_builder_requires_a_server() {
        let Err(err) = Orchestrator::builder(Config::default()).build() else {
            panic!("expected ServerMissing");
        };
        assert_eq!(err.as_label(), "orchestrator_server_missing");
    }

    #[test]
    fn test_builder_rejects_unknown_dependency() {
        let Err(err) = Orchestrator::builder(Config::default())
            .server(ServiceSpec::new("server", instant_driver()))
            .dependent_on(ServiceSpec::new("feature", instant_driver()), "missing")
            .build()
        else {
            panic!("expected UnknownDependency");
        };
        match err {
            OrchestratorError::UnknownDependency { unit, dependency } => {
                assert_eq!(unit, "feature");
                assert_eq!(dependency, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
