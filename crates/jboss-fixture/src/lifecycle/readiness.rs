//! Boot readiness polling.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use super::supervisor::Supervisor;
use super::types::StartOutcome;
use crate::control::{ManagementClient, StatusParser, check_started};

/// Delay between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Single readiness probe. Any failure to reach or parse the console reads
/// as "not ready".
pub(crate) fn probe_ready(client: &dyn ManagementClient, parser: &dyn StatusParser) -> bool {
    match check_started(client, parser) {
        Ok(started) => started,
        Err(error) => {
            debug!(target: LIFECYCLE_TARGET, %error, "readiness probe failed");
            false
        }
    }
}

/// Polls the console until the launched server reports it has started.
pub struct ReadinessMonitor<'a> {
    client: &'a dyn ManagementClient,
    parser: &'a dyn StatusParser,
    supervisor: &'a Supervisor,
    interval: Duration,
}

impl<'a> ReadinessMonitor<'a> {
    #[must_use]
    pub fn new(
        client: &'a dyn ManagementClient,
        parser: &'a dyn StatusParser,
        supervisor: &'a Supervisor,
    ) -> Self {
        Self {
            client,
            parser,
            supervisor,
            interval: POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Waits up to `timeout` for the server to report ready.
    ///
    /// A zero `timeout` returns immediately with the launched pid. The process
    /// is checked before every probe so a crashed boot fails fast instead of
    /// running out the clock.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::StartupTimeout`] when the deadline passes and
    /// [`LifecycleError::ProcessExited`] when the process dies first.
    pub fn await_ready(&self, timeout: Duration) -> Result<StartOutcome, LifecycleError> {
        let started = Instant::now();
        if timeout.is_zero() {
            return self.supervisor.pid().map_or_else(
                || Err(LifecycleError::ProcessExited { elapsed: started.elapsed() }),
                |pid| Ok(StartOutcome::Launched { pid }),
            );
        }

        let mut attempts = 0_u32;
        loop {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(LifecycleError::StartupTimeout { elapsed, timeout });
            }
            if !self.supervisor.is_running() {
                return Err(LifecycleError::ProcessExited { elapsed });
            }
            attempts += 1;
            if probe_ready(self.client, self.parser) {
                let Some(pid) = self.supervisor.pid() else {
                    return Err(LifecycleError::ProcessExited { elapsed });
                };
                let elapsed = started.elapsed();
                info!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    attempts,
                    elapsed_ms = elapsed.as_millis(),
                    "server reported ready"
                );
                return Ok(StartOutcome::Ready { pid, elapsed });
            }
            let remaining = timeout.saturating_sub(started.elapsed());
            thread::sleep(self.interval.min(remaining));
        }
    }
}
