//! Termination signal routing.
//!
//! A [`SignalGuard`] listens for SIGINT, SIGTERM, SIGQUIT and SIGHUP on a
//! background thread. While armed, the first signal runs the stop action on
//! its own thread; signals arriving during that stop are ignored. With
//! nothing armed, a signal gets its default disposition so the host can
//! still be interrupted. SIGKILL cannot be observed, so a killed host leaves
//! the server behind.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use signal_hook::low_level::emulate_default_handler;
use tracing::{debug, info, warn};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;

/// Signals that trigger a stop.
pub const STOP_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGQUIT, SIGHUP];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Armed,
    Stopping,
}

#[derive(Debug)]
struct Routing {
    phase: Mutex<Phase>,
    changed: Condvar,
}

impl Routing {
    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, from: &[Phase], to: Phase) -> bool {
        let mut phase = self.lock();
        if !from.contains(&*phase) {
            return false;
        }
        *phase = to;
        self.changed.notify_all();
        true
    }

    fn settle(&self) {
        self.set(&[Phase::Stopping], Phase::Idle);
    }
}

/// Installed signal handlers; dropping the guard stops listening.
#[derive(Debug)]
pub struct SignalGuard {
    handle: Handle,
    routing: Arc<Routing>,
}

impl SignalGuard {
    /// Registers the stop signals. The guard starts disarmed: call
    /// [`SignalGuard::arm`] once there is something for `on_signal` to stop.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::SignalInstall`] if registration or the
    /// listener thread fails.
    pub fn install<F>(on_signal: F) -> Result<Self, LifecycleError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|source| LifecycleError::SignalInstall { source })?;
        let handle = signals.handle();
        let routing = Arc::new(Routing {
            phase: Mutex::new(Phase::Idle),
            changed: Condvar::new(),
        });

        let listener_routing = Arc::clone(&routing);
        let on_signal = Arc::new(on_signal);
        let spawned = thread::Builder::new()
            .name(String::from("signal-listener"))
            .spawn(move || {
                for signal in signals.forever() {
                    dispatch(signal, &listener_routing, &on_signal);
                }
            });
        if let Err(source) = spawned {
            handle.close();
            return Err(LifecycleError::SignalInstall { source });
        }

        Ok(Self { handle, routing })
    }

    /// Makes the next signal run the stop action.
    pub fn arm(&self) {
        let mut phase = self.routing.lock();
        *phase = Phase::Armed;
        self.routing.changed.notify_all();
    }

    /// Withdraws an armed stop. Returns `false` when a signal already took
    /// it, or nothing was armed.
    pub fn disarm(&self) -> bool {
        self.routing.set(&[Phase::Armed], Phase::Idle)
    }

    /// Whether the next signal will run the stop action.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        *self.routing.lock() == Phase::Armed
    }

    /// Blocks while a stop is armed or running.
    pub fn wait(&self) {
        let phase = self.routing.lock();
        let _settled = self
            .routing
            .changed
            .wait_while(phase, |phase| *phase != Phase::Idle)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`SignalGuard::wait`], giving up after `timeout`. Returns whether
    /// the guard settled.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let phase = self.routing.lock();
        let (phase, _) = self
            .routing
            .changed
            .wait_timeout_while(phase, timeout, |phase| *phase != Phase::Idle)
            .unwrap_or_else(PoisonError::into_inner);
        *phase == Phase::Idle
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
    }
}

fn dispatch<F>(signal: i32, routing: &Arc<Routing>, on_signal: &Arc<F>)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = {
        let mut phase = routing.lock();
        let previous = *phase;
        if previous == Phase::Armed {
            *phase = Phase::Stopping;
        }
        previous
    };
    match previous {
        Phase::Armed => {
            info!(target: LIFECYCLE_TARGET, signal, "termination signal received");
            // Off the listener thread, so signals during the stop are seen.
            let stop = Arc::clone(on_signal);
            let stop_routing = Arc::clone(routing);
            let spawned = thread::Builder::new()
                .name(String::from("signal-stop"))
                .spawn(move || {
                    (*stop)();
                    stop_routing.settle();
                });
            if let Err(error) = spawned {
                warn!(target: LIFECYCLE_TARGET, %error, "stopping on the listener thread");
                (**on_signal)();
                routing.settle();
            }
        }
        Phase::Stopping => {
            debug!(target: LIFECYCLE_TARGET, signal, "stop already in progress");
        }
        Phase::Idle => {
            debug!(target: LIFECYCLE_TARGET, signal, "nothing to stop; applying default action");
            if let Err(error) = emulate_default_handler(signal) {
                warn!(target: LIFECYCLE_TARGET, signal, %error, "failed to apply default action");
            }
        }
    }
}
