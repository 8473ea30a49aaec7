//! # ManagedUnit: the lifecycle state machine.
//!
//! A [`ManagedUnit`] tracks one external resource (the local server
//! process, or a service hosted on it) through the state edges defined in
//! [`ServiceState`](crate::ServiceState), publishing one
//! [`StatusEvent`](crate::StatusEvent) per transition.
//!
//! ## Event flow
//! ```text
//! start():                       stop():
//!   NotStarted ──► Starting        Started ──► Stopping
//!        driver.begin_start()           driver.begin_stop()
//!               │                              │
//!        ┌──────┴──────┐                ┌──────┴──────┐
//!        ▼             ▼                ▼             ▼
//!     Started        Failed          Stopped        Failed
//! ```
//!
//! ## Dependency gating
//! A unit built with [`ManagedUnit::with_dependency`] defers its start
//! until the dependency reports `Started`:
//! ```text
//! dependent.start()                 dependency reaches Started
//!   dependency not Started            ├─► ordinary listeners run first
//!   └─► waiter registered,            └─► waiter fires once
//!       unit stays NotStarted               └─► dependent enters Starting
//!
//! dependency reaches Failed while the start is pending
//!   └─► waiter consumed, dependent stays NotStarted (no event, no error)
//! ```
//!
//! ## Rules
//! - `start()`/`stop()` never block and never fail; outcomes surface only
//!   through status events. Both must be called from within a Tokio
//!   runtime (the async operation is spawned onto it).
//! - At most one start-or-stop operation is in flight per unit; the state
//!   edges themselves enforce this.
//! - Per unit, transition + delivery are serialized: listeners for one
//!   event never run concurrently with each other or with delivery of the
//!   next event for the same unit. Listeners may operate on *other* units
//!   but must not call `start()`/`stop()` on the unit they observe.
//! - `stop()` while `Starting` is recorded and executed once the start
//!   resolves `Started` (there is no mid-flight cancellation); it is
//!   discarded when the start resolves `Failed`.
//! - Subscribing does not replay past events.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time;

use crate::drivers::DriverRef;
use crate::error::ServiceError;
use crate::events::listeners::{self, ListenerSet};
use crate::events::{StatusEvent, Subscription};
use crate::service::{ServiceSpec, ServiceState};

/// Outcome of attaching a waiter to a dependency.
enum WaiterOutcome {
    /// The dependency is already `Started`; no waiter was registered.
    AlreadyStarted,
    /// The waiter was registered and will fire on the dependency's next
    /// `Started` (resume) or `Failed` (abandon) transition.
    Registered,
}

struct Inner {
    listeners: ListenerSet,
    /// Units whose pending start is gated on this unit reaching `Started`.
    waiters: Vec<Weak<ManagedUnit>>,
    last_error: Option<ServiceError>,
    /// Set while this unit's own start is deferred behind a dependency.
    pending_start: bool,
    /// Set when `stop()` arrived while `Starting`.
    stop_requested: bool,
}

/// State machine for one managed process or service.
///
/// Constructed through [`ManagedUnit::new`] /
/// [`ManagedUnit::with_dependency`]; always lives behind an `Arc` so the
/// spawned lifecycle operations and dependency waiters can reach it.
pub struct ManagedUnit {
    id: Arc<str>,
    driver: DriverRef,
    start_timeout: Option<Duration>,
    stop_timeout: Option<Duration>,
    /// Back reference used only to read state and register a waiter.
    dependency: Option<Weak<ManagedUnit>>,
    self_ref: Weak<ManagedUnit>,
    state: watch::Sender<ServiceState>,
    /// Serializes transition + event delivery for this unit.
    dispatch: Mutex<()>,
    inner: Mutex<Inner>,
}

impl ManagedUnit {
    /// Creates a unit with no dependency.
    pub fn new(spec: ServiceSpec) -> Arc<Self> {
        Self::build(spec, None)
    }

    /// Creates a unit that starts only once `dependency` is `Started`.
    ///
    /// The reference is held weakly: the dependency is read and observed,
    /// never owned.
    pub fn with_dependency(spec: ServiceSpec, dependency: &Arc<ManagedUnit>) -> Arc<Self> {
        Self::build(spec, Some(Arc::downgrade(dependency)))
    }

    fn build(spec: ServiceSpec, dependency: Option<Weak<ManagedUnit>>) -> Arc<Self> {
        let (id, driver, start_timeout, stop_timeout) = spec.into_parts();
        let (state, _) = watch::channel(ServiceState::NotStarted);
        Arc::new_cyclic(|self_ref| Self {
            id,
            driver,
            start_timeout,
            stop_timeout,
            dependency,
            self_ref: self_ref.clone(),
            state,
            dispatch: Mutex::new(()),
            inner: Mutex::new(Inner {
                listeners: ListenerSet::new(),
                waiters: Vec::new(),
                last_error: None,
                pending_start: false,
                stop_requested: false,
            }),
        })
    }

    /// Returns the stable unit id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current state.
    ///
    /// Lock-free; always consistent with the most recently delivered
    /// status event.
    pub fn current_state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Returns a watch receiver observing state changes.
    ///
    /// This is the supported primitive for building "wait until ready" on
    /// top of the core: `rx.wait_for(|s| *s == ServiceState::Started)`.
    pub fn state_watch(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Returns the error recorded at the most recent entry into `Failed`,
    /// if any. Cleared whenever the unit re-enters `Starting`.
    pub fn last_error(&self) -> Option<ServiceError> {
        self.lock_inner().last_error.clone()
    }

    /// Registers a callback invoked synchronously, in subscription order,
    /// on every **subsequent** status event of this unit.
    ///
    /// Past events are not replayed: a subscriber added after `Started`
    /// was delivered will not see it and should query
    /// [`current_state`](Self::current_state) if it needs the present
    /// state.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.lock_inner().listeners.insert(Arc::new(callback))
    }

    /// Removes a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.lock_inner().listeners.remove(&subscription)
    }

    /// Begins (or defers) the start of this unit. Never blocks.
    ///
    /// - No-op while `Starting`, `Started` or `Stopping`.
    /// - With a dependency that is not yet `Started` (including `Failed`),
    ///   records a pending start and returns; the deferred start fires on
    ///   the dependency's next `Started` transition and is abandoned on
    ///   its next `Failed` transition.
    /// - Otherwise transitions to `Starting` synchronously (the event is
    ///   delivered before this call returns) and spawns the driver's start
    ///   operation.
    pub fn start(&self) {
        let guard = self.lock_dispatch();
        if !self.current_state().can_begin_start() {
            return;
        }
        if self.lock_inner().pending_start {
            return;
        }

        if let Some(dep_ref) = &self.dependency {
            let Some(dependency) = dep_ref.upgrade() else {
                tracing::warn!(unit = %self.id, "dependency no longer exists; start ignored");
                return;
            };
            match dependency.register_waiter(self.self_ref.clone()) {
                WaiterOutcome::AlreadyStarted => {}
                WaiterOutcome::Registered => {
                    self.lock_inner().pending_start = true;
                    tracing::debug!(
                        unit = %self.id,
                        dependency = %dependency.id,
                        "start deferred until dependency is started"
                    );
                    return;
                }
            }
        }

        self.begin_start(&guard);
    }

    /// Begins (or defers) the stop of this unit. Never blocks.
    ///
    /// - No-op while `Stopping`, or from `Stopped`, `NotStarted` and
    ///   `Failed` (a pending deferred start is cleared from `NotStarted`).
    /// - While `Starting`, the stop is recorded and runs once the start
    ///   resolves `Started`.
    /// - From `Started`, transitions to `Stopping` synchronously and
    ///   spawns the driver's stop operation.
    pub fn stop(&self) {
        let guard = self.lock_dispatch();
        match self.current_state() {
            ServiceState::Started => self.begin_stop(&guard),
            ServiceState::Starting => {
                self.lock_inner().stop_requested = true;
                tracing::debug!(unit = %self.id, "stop deferred until start resolves");
            }
            ServiceState::NotStarted => {
                let mut inner = self.lock_inner();
                if inner.pending_start {
                    inner.pending_start = false;
                    tracing::debug!(unit = %self.id, "pending start cleared by stop");
                }
            }
            ServiceState::Stopping | ServiceState::Stopped | ServiceState::Failed => {}
        }
    }

    // ---------------------------
    // Dependency waiters
    // ---------------------------

    /// Attaches `waiter` unless this unit is already `Started`.
    ///
    /// State reads and waiter registration share the `inner` lock with
    /// state writes and waiter draining, so a waiter is either observed by
    /// the next `Started`/`Failed` transition or told the dependency is
    /// already up; it can never fall between the two.
    fn register_waiter(&self, waiter: Weak<ManagedUnit>) -> WaiterOutcome {
        let mut inner = self.lock_inner();
        if self.current_state() == ServiceState::Started {
            WaiterOutcome::AlreadyStarted
        } else {
            inner.waiters.push(waiter);
            WaiterOutcome::Registered
        }
    }

    /// Runs the deferred start once the dependency reported `Started`.
    fn resume_pending_start(&self) {
        let guard = self.lock_dispatch();
        {
            let mut inner = self.lock_inner();
            if !inner.pending_start {
                // stop() cleared the request; the waiter is stale.
                return;
            }
            inner.pending_start = false;
        }
        if !self.current_state().can_begin_start() {
            return;
        }
        self.begin_start(&guard);
    }

    /// Drops the deferred start because the dependency failed.
    ///
    /// Deliberately silent: the failure is already visible through the
    /// dependency's own events, and "the thing I depend on never came up"
    /// is not double-reported here.
    fn abandon_pending_start(&self) {
        let mut inner = self.lock_inner();
        if inner.pending_start {
            inner.pending_start = false;
            tracing::debug!(unit = %self.id, "pending start abandoned: dependency failed");
        }
    }

    // ---------------------------
    // Transitions
    // ---------------------------

    fn begin_start(&self, guard: &MutexGuard<'_, ()>) {
        {
            let mut inner = self.lock_inner();
            inner.pending_start = false;
            inner.last_error = None;
        }
        self.apply(guard, ServiceState::Starting, None);

        let Some(unit) = self.self_ref.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let result = drive(unit.driver.begin_start(), unit.start_timeout).await;
            unit.complete_start(result);
        });
    }

    fn complete_start(&self, result: Result<(), ServiceError>) {
        let guard = self.lock_dispatch();
        match result {
            Ok(()) => {
                self.apply(&guard, ServiceState::Started, None);
                let deferred = std::mem::take(&mut self.lock_inner().stop_requested);
                if deferred {
                    tracing::debug!(unit = %self.id, "running deferred stop");
                    self.begin_stop(&guard);
                }
            }
            Err(err) => {
                self.lock_inner().stop_requested = false;
                tracing::warn!(unit = %self.id, error = %err, "start failed");
                self.apply(&guard, ServiceState::Failed, Some(err));
            }
        }
    }

    fn begin_stop(&self, guard: &MutexGuard<'_, ()>) {
        self.apply(guard, ServiceState::Stopping, None);

        let Some(unit) = self.self_ref.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let result = drive(unit.driver.begin_stop(), unit.stop_timeout).await;
            unit.complete_stop(result);
        });
    }

    fn complete_stop(&self, result: Result<(), ServiceError>) {
        let guard = self.lock_dispatch();
        match result {
            Ok(()) => self.apply(&guard, ServiceState::Stopped, None),
            Err(err) => {
                tracing::warn!(unit = %self.id, error = %err, "stop failed");
                self.apply(&guard, ServiceState::Failed, Some(err));
            }
        }
    }

    /// Performs one transition: update state, build the event, deliver to
    /// the listener snapshot, then fire drained waiters.
    ///
    /// The `_guard` parameter witnesses that the caller holds the dispatch
    /// lock; waiters fire after the ordinary listener loop so a dependent
    /// never enters `Starting` before this unit's `Started` event has been
    /// fully delivered.
    fn apply(
        &self,
        _guard: &MutexGuard<'_, ()>,
        next: ServiceState,
        error: Option<ServiceError>,
    ) {
        let (event, listeners, waiters) = {
            let mut inner = self.lock_inner();
            let previous = *self.state.borrow();
            self.state.send_replace(next);

            let mut event = StatusEvent::transition(Arc::clone(&self.id), previous, next);
            if let Some(err) = error {
                event = event.with_error(err.to_string());
                inner.last_error = Some(err);
            }

            let listeners = inner.listeners.snapshot();
            let waiters = if matches!(next, ServiceState::Started | ServiceState::Failed) {
                std::mem::take(&mut inner.waiters)
            } else {
                Vec::new()
            };
            (event, listeners, waiters)
        };

        tracing::debug!(unit = %self.id, from = %event.previous, to = %event.current, "state transition");
        listeners::dispatch(&listeners, &event);

        for waiter in waiters {
            let Some(dependent) = waiter.upgrade() else {
                continue;
            };
            match next {
                ServiceState::Started => dependent.resume_pending_start(),
                _ => dependent.abandon_pending_start(),
            }
        }
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs one opaque operation with the unit's timeout bound and panic
/// isolation. Exactly one terminal outcome is produced.
async fn drive<F>(operation: F, bound: Option<Duration>) -> Result<(), ServiceError>
where
    F: std::future::Future<Output = Result<(), ServiceError>>,
{
    let guarded = std::panic::AssertUnwindSafe(operation).catch_unwind();
    let outcome = match bound {
        Some(dur) if dur > Duration::ZERO => match time::timeout(dur, guarded).await {
            Ok(res) => res,
            Err(_elapsed) => return Err(ServiceError::Timeout { timeout: dur }),
        },
        _ => guarded.await,
    };
    outcome.map_err(|panic| ServiceError::Panicked {
        reason: listeners::panic_message(panic.as_ref()).to_string(),
    })?
}
