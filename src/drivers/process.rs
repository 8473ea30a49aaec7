//! # Child-process driver.
//!
//! [`ProcessDriver`] backs a managed unit with a real OS process:
//!
//! - **start**: spawn the executable, then (optionally) poll an async
//!   readiness probe until it reports ready, failing fast if the child
//!   exits during startup;
//! - **stop**: on Unix, deliver SIGTERM and wait up to the configured
//!   signal grace for a clean exit, then escalate to a hard kill; on other
//!   platforms, kill directly.
//!
//! ```text
//! begin_start:
//!   spawn(program, args) ──► probe().await ──false──► child alive? ──► sleep(poll) ──┐
//!        │                        │ true                  │ exited                   │
//!        │ spawn error            ▼                       ▼                          │
//!        ▼                      Ok(())            Err(Startup: exited early)         │
//!   Err(Startup)                  ▲                                                  │
//!                                 └──────────────────────────────────────────────────┘
//! begin_stop (unix):
//!   SIGTERM ──► wait(stop_signal_grace) ──timeout──► kill()
//! ```
//!
//! Readiness probing mirrors how local-server hosts are actually checked:
//! the process being alive is not enough, its service endpoint must
//! answer. The probe is any `Fn() -> Future<Output = bool>`, typically a
//! cheap connect or HTTP ping supplied by the caller.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time;

use crate::config::Config;
use crate::drivers::driver::Driver;
use crate::error::ServiceError;

/// Boxed asynchronous readiness probe.
type ReadyProbe = Box<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Driver that runs an external executable as the unit's resource.
///
/// ## Example
/// ```no_run
/// use std::time::Duration;
/// use servisor::ProcessDriver;
///
/// let driver = ProcessDriver::new("/opt/localserver/bin/server")
///     .arg("--port")
///     .arg("50051")
///     .with_poll_interval(Duration::from_millis(200))
///     .with_ready_probe(|| async {
///         tokio::net::TcpStream::connect(("127.0.0.1", 50051)).await.is_ok()
///     });
/// # let _ = driver;
/// ```
pub struct ProcessDriver {
    program: PathBuf,
    args: Vec<OsString>,
    ready: Option<ReadyProbe>,
    poll_interval: Duration,
    stop_signal_grace: Duration,
    child: Mutex<Option<Child>>,
}

impl ProcessDriver {
    /// Creates a driver for the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            ready: None,
            poll_interval: Duration::from_millis(100),
            stop_signal_grace: Duration::from_secs(5),
            child: Mutex::new(None),
        }
    }

    /// Creates a driver inheriting `stop_signal_grace` from global config.
    pub fn with_defaults(program: impl Into<PathBuf>, cfg: &Config) -> Self {
        Self::new(program).with_stop_signal_grace(cfg.stop_signal_grace)
    }

    /// Appends one argument to the command line.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments to the command line.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the readiness probe polled after spawn. Without a probe the
    /// unit reports `Started` as soon as the process has been spawned.
    pub fn with_ready_probe<F, Fut>(mut self, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        self.ready = Some(Box::new(move || probe().boxed()));
        self
    }

    /// Sets the delay between readiness probe attempts.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the grace between SIGTERM and hard kill.
    pub fn with_stop_signal_grace(mut self, grace: Duration) -> Self {
        self.stop_signal_grace = grace;
        self
    }

    fn spawn_error(&self, err: &std::io::Error) -> ServiceError {
        ServiceError::Startup {
            reason: format!("failed to launch {}: {err}", self.program.display()),
        }
    }
}

#[async_trait]
impl Driver for ProcessDriver {
    async fn begin_start(&self) -> Result<(), ServiceError> {
        let mut slot = self.child.lock().await;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        let child = cmd.spawn().map_err(|e| self.spawn_error(&e))?;
        tracing::debug!(program = %self.program.display(), pid = child.id(), "process spawned");
        *slot = Some(child);

        let Some(probe) = &self.ready else {
            return Ok(());
        };

        loop {
            if probe().await {
                return Ok(());
            }
            if let Some(child) = slot.as_mut() {
                let exited = child.try_wait().map_err(|e| ServiceError::Startup {
                    reason: format!("wait on {}: {e}", self.program.display()),
                })?;
                if let Some(status) = exited {
                    *slot = None;
                    return Err(ServiceError::Startup {
                        reason: format!(
                            "{} exited during startup: {status}",
                            self.program.display()
                        ),
                    });
                }
            }
            time::sleep(self.poll_interval).await;
        }
    }

    async fn begin_stop(&self) -> Result<(), ServiceError> {
        let mut slot = self.child.lock().await;
        let Some(mut child) = slot.take() else {
            return Ok(());
        };

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            // SIGTERM first so the server can release its port and flush.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            match time::timeout(self.stop_signal_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!(program = %self.program.display(), %status, "process exited on SIGTERM");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    return Err(ServiceError::Shutdown {
                        reason: format!("wait on {}: {e}", self.program.display()),
                    });
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        program = %self.program.display(),
                        grace = ?self.stop_signal_grace,
                        "process ignored SIGTERM, killing"
                    );
                }
            }
        }

        child.kill().await.map_err(|e| ServiceError::Shutdown {
            reason: format!("kill {}: {e}", self.program.display()),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_failure_is_a_startup_error() {
        let driver = ProcessDriver::new("/nonexistent/definitely-not-a-binary");
        let err = driver.begin_start().await.expect_err("spawn must fail");
        assert_eq!(err.as_label(), "service_startup_failed");
    }

    #[tokio::test]
    async fn test_early_exit_is_detected_while_probing() {
        let driver = ProcessDriver::new("false")
            .with_poll_interval(Duration::from_millis(10))
            .with_ready_probe(|| async { false });

        let err = driver.begin_start().await.expect_err("child exits early");
        match err {
            ServiceError::Startup { reason } => {
                assert!(reason.contains("exited during startup"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_sigterm_stops_a_running_child() {
        let driver = ProcessDriver::new("sleep")
            .arg("30")
            .with_stop_signal_grace(Duration::from_secs(2));

        driver.begin_start().await.expect("sleep spawns");
        driver.begin_stop().await.expect("sleep exits on SIGTERM");
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_no_op() {
        let driver = ProcessDriver::new("sleep");
        driver.begin_stop().await.expect("nothing to stop");
    }
}
