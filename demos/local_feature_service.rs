//! # Demo: local server with a dependent feature service.
//!
//! Demonstrates the full orchestration flow:
//! - Build a server unit and one dependent service from closure drivers
//!   (stand-ins for a real process boot and a service definition load).
//! - Attach a console listener reacting to readiness the way layer
//!   creation code would.
//! - Start everything, observe the gated startup, then shut down in
//!   reverse order.
//!
//! ## Run
//! ```bash
//! cargo run --example local_feature_service
//! ```

use std::time::Duration;

use servisor::{
    Config, DriverFn, DriverRef, LogListener, Orchestrator, ServiceError, ServiceSpec,
    ServiceState,
};

/// Pretends to boot the local server executable: slow, then ready.
fn server_driver() -> DriverRef {
    DriverFn::arc(
        || async {
            println!("[server] launching process...");
            tokio::time::sleep(Duration::from_millis(400)).await;
            println!("[server] ready");
            Ok::<_, ServiceError>(())
        },
        || async {
            println!("[server] terminating process...");
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ServiceError>(())
        },
    )
}

/// Pretends to publish a feature service from a local data package.
fn feature_driver() -> DriverRef {
    DriverFn::arc(
        || async {
            println!("[feature] loading service definition...");
            tokio::time::sleep(Duration::from_millis(150)).await;
            println!("[feature] published");
            Ok::<_, ServiceError>(())
        },
        || async {
            println!("[feature] unpublishing...");
            Ok::<_, ServiceError>(())
        },
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = Config {
        grace: Duration::from_secs(5),
        ..Config::default()
    };

    let orchestrator = Orchestrator::builder(cfg)
        .server(ServiceSpec::new("local-server", server_driver()))
        .dependent(ServiceSpec::new("feature-service", feature_driver()))
        .build()?;

    // Standard logging for every unit.
    let _server_log = LogListener::attach(&orchestrator.server());
    for handle in orchestrator.dependents() {
        let _sub = LogListener::attach(&handle);
    }

    // This is where a map application would create its display layer.
    if let Some(features) = orchestrator.unit("feature-service") {
        let _layer_sub = features.subscribe(|ev| {
            if ev.current == ServiceState::Started {
                println!(">>> feature service ready: creating the layer now");
            }
        });
    }

    orchestrator.start_all();

    // Wait until the dependent is up (built on the watch primitive).
    if let Some(features) = orchestrator.unit("feature-service") {
        let mut rx = features.state_watch();
        rx.wait_for(|s| !matches!(s, ServiceState::NotStarted | ServiceState::Starting))
            .await?;
        println!("feature service settled as: {}", features.current_state());
    }

    println!("shutting down (reverse order)...");
    orchestrator.stop_all().await?;
    println!("done");
    Ok(())
}
