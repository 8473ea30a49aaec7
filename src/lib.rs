//! # servisor
//!
//! **Servisor** is a lifecycle orchestration library for a local server
//! process and the services that depend on it.
//!
//! It provides primitives to model a background server and its dependent
//! services as explicit state machines, gate each dependent's startup on
//! its dependency being up, propagate status to subscribers, and tear
//! everything down in reverse order. The crate knows nothing about what a
//! hosted service *does* — it only drives start/stop and reports status.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐      ┌────────────────┐     ┌────────────────┐
//!  │ ServiceSpec  │      │  ServiceSpec   │     │  ServiceSpec   │
//!  │   (server)   │      │ (dependent #1) │     │ (dependent #2) │
//!  └──────┬───────┘      └───────┬────────┘     └───────┬────────┘
//!         ▼                      ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (composition root owns it; no globals)              │
//! │  - server: ManagedUnit                                            │
//! │  - dependents: Vec<ManagedUnit>  (registration order)             │
//! │  - start_all() / stop_all() / run()                               │
//! └──────┬──────────────────────┬──────────────────────┬─────────────┘
//!        ▼                      ▼                      ▼
//!  ┌────────────┐        ┌────────────┐         ┌────────────┐
//!  │ ManagedUnit│◄─waits─│ ManagedUnit│◄─waits──│ ManagedUnit│
//!  │  (server)  │        │ (dependent)│         │ (dependent)│
//!  └─────┬──────┘        └─────┬──────┘         └─────┬──────┘
//!        │ drives              │ drives               │ drives
//!        ▼                     ▼                      ▼
//!   Driver::begin_start / begin_stop   (opaque external operations)
//!
//! Status flow (per unit, synchronous and ordered):
//!   transition ──► StatusEvent ──► listeners (subscription order)
//!                                   └─► waiters (dependents) fire last
//! ```
//!
//! ### Lifecycle
//! ```text
//! start_all()
//!   ├─► server.start()           NotStarted ─► Starting ─► Started|Failed
//!   └─► dependent.start()        pending until server Started,
//!                                then Starting ─► Started|Failed;
//!                                abandoned silently if the server Failed
//!
//! stop_all()                     dependents in reverse order, each
//!   ├─► dependent.stop()         awaited to Stopped|Failed (≤ grace),
//!   └─► server.stop()            server strictly last
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits              |
//! |-----------------|----------------------------------------------------------|---------------------------------|
//! | **Units**       | Explicit lifecycle state machines with dependency gating.| [`ManagedUnit`], [`ServiceSpec`]|
//! | **Status**      | Synchronous, ordered per-unit event delivery.            | [`StatusEvent`], [`Subscription`]|
//! | **Drivers**     | Opaque start/stop operations behind each unit.           | [`Driver`], [`DriverFn`]        |
//! | **Sequencing**  | Dependency-ordered startup, reverse-order shutdown.      | [`Orchestrator`]                |
//! | **Errors**      | Typed startup/shutdown/timeout failures.                 | [`ServiceError`], [`OrchestratorError`] |
//! | **Config**      | Grace periods and default operation timeouts.            | [`Config`]                      |
//!
//! ## Optional features
//! - `process` *(default)*: [`ProcessDriver`], a child-process driver with
//!   readiness probing and SIGTERM-then-kill shutdown.
//!
//! ## Example
//! ```no_run
//! use servisor::{Config, DriverFn, DriverRef, Orchestrator, ServiceError, ServiceSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server: DriverRef = DriverFn::arc(
//!         || async {
//!             // boot the local server process, poll until ready...
//!             Ok::<_, ServiceError>(())
//!         },
//!         || async { Ok::<_, ServiceError>(()) },
//!     );
//!     let features: DriverRef = DriverFn::arc(
//!         || async { Ok::<_, ServiceError>(()) },
//!         || async { Ok::<_, ServiceError>(()) },
//!     );
//!
//!     let orchestrator = Orchestrator::builder(Config::default())
//!         .server(ServiceSpec::new("local-server", server))
//!         .dependent(ServiceSpec::new("feature-service", features))
//!         .build()?;
//!
//!     // React to readiness, e.g. by creating a display layer.
//!     if let Some(features) = orchestrator.unit("feature-service") {
//!         let _sub = features.subscribe(|ev| {
//!             println!("feature-service is now {}", ev.current);
//!         });
//!     }
//!
//!     // Start everything, park until SIGINT/SIGTERM, stop in reverse.
//!     orchestrator.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod drivers;
mod error;
mod events;
mod service;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Orchestrator, OrchestratorBuilder};
pub use drivers::{Driver, DriverFn, DriverRef};
pub use error::{OrchestratorError, ServiceError};
pub use events::{StatusEvent, Subscription};
pub use service::{ManagedUnit, ServiceSpec, ServiceState, StatusHandle};
pub use subscribers::LogListener;

// Optional: child-process driver.
// Enable with: `--features process` (on by default).
#[cfg(feature = "process")]
pub use drivers::ProcessDriver;
