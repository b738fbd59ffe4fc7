//! Ownership of the launched server process.
//!
//! The supervisor spawns the server, drains its console output so the pipes
//! never fill, and tears the process down either through the management
//! console or by interrupting it.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::LIFECYCLE_TARGET;
use super::command::LaunchCommand;
use super::error::LifecycleError;
use super::types::StopOutcome;
use crate::control::{ManagementClient, request_shutdown};

/// Time a stopping server is given to exit before it is abandoned or killed.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

const REAP_INTERVAL: Duration = Duration::from_millis(100);
const CONSOLE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::console");

/// A launched server process.
#[derive(Debug)]
struct ServerHandle {
    pid: u32,
    child: Child,
    launched_at: Instant,
}

/// Tracks at most one server process on behalf of a controller.
#[derive(Debug)]
pub struct Supervisor {
    handle: Mutex<Option<ServerHandle>>,
    shutdown_timeout: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SHUTDOWN_TIMEOUT)
    }
}

impl Supervisor {
    #[must_use]
    pub const fn new(shutdown_timeout: Duration) -> Self {
        Self {
            handle: Mutex::new(None),
            shutdown_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ServerHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns `command` and starts draining its output.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadySupervised`] when a process is
    /// already held, or [`LifecycleError::Launch`] when spawning fails.
    pub fn launch(&self, command: &LaunchCommand) -> Result<u32, LifecycleError> {
        let mut slot = self.lock();
        if let Some(handle) = slot.as_ref() {
            return Err(LifecycleError::AlreadySupervised { pid: handle.pid });
        }

        let mut process = command.to_command();
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = process.spawn().map_err(|source| LifecycleError::Launch {
            command: command.to_string(),
            source,
        })?;
        let pid = child.id();
        if let Some(stdout) = child.stdout.take() {
            spawn_drain("stdout", pid, stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_drain("stderr", pid, stderr);
        }
        info!(target: LIFECYCLE_TARGET, pid, command = %command, "launched server");
        *slot = Some(ServerHandle {
            pid,
            child,
            launched_at: Instant::now(),
        });
        Ok(pid)
    }

    /// Pid of the supervised process, if any.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.lock().as_ref().map(|handle| handle.pid)
    }

    /// Reports whether the supervised process is still alive, forgetting it
    /// once it has exited.
    #[must_use]
    pub fn is_running(&self) -> bool {
        let mut slot = self.lock();
        let Some(handle) = slot.as_mut() else {
            return false;
        };
        let pid = handle.pid;
        match handle.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                info!(target: LIFECYCLE_TARGET, pid, %status, "server process exited");
                *slot = None;
                false
            }
            Err(error) => {
                warn!(target: LIFECYCLE_TARGET, pid, %error, "failed to poll server process");
                true
            }
        }
    }

    /// Stops the supervised process.
    ///
    /// With `graceful` set, the console is asked to shut the server down
    /// first; the process is interrupted only when that request fails. The
    /// supervisor stays locked for the whole call, so concurrent stops see
    /// [`StopOutcome::NotRunning`] once the first completes.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be signalled or reaped. The
    /// process remains supervised in that case.
    pub fn terminate(
        &self,
        client: &dyn ManagementClient,
        graceful: bool,
    ) -> Result<StopOutcome, LifecycleError> {
        let mut slot = self.lock();
        let Some(mut handle) = slot.take() else {
            return Ok(StopOutcome::NotRunning);
        };
        match self.stop_handle(&mut handle, client, graceful) {
            Ok(outcome) => {
                info!(
                    target: LIFECYCLE_TARGET,
                    pid = handle.pid,
                    uptime_ms = handle.launched_at.elapsed().as_millis(),
                    outcome = %outcome,
                    "server stopped"
                );
                if matches!(handle.child.try_wait(), Ok(None)) {
                    spawn_reaper(handle.pid, handle.child);
                }
                Ok(outcome)
            }
            Err(error) => {
                *slot = Some(handle);
                Err(error)
            }
        }
    }

    fn stop_handle(
        &self,
        handle: &mut ServerHandle,
        client: &dyn ManagementClient,
        graceful: bool,
    ) -> Result<StopOutcome, LifecycleError> {
        let pid = handle.pid;
        if graceful && shutdown_accepted(client, pid) {
            let exited = wait_for_exit(&mut handle.child, self.shutdown_timeout)
                .map_err(|source| LifecycleError::Reap { pid, source })?;
            if exited.is_none() {
                warn!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    timeout_ms = self.shutdown_timeout.as_millis(),
                    "server accepted shutdown but is still running; leaving it"
                );
            }
            return Ok(StopOutcome::Stopped { pid });
        }

        interrupt(pid)?;
        let exited = wait_for_exit(&mut handle.child, self.shutdown_timeout)
            .map_err(|source| LifecycleError::Reap { pid, source })?;
        if exited.is_none() {
            warn!(
                target: LIFECYCLE_TARGET,
                pid,
                timeout_ms = self.shutdown_timeout.as_millis(),
                "server ignored SIGINT; killing"
            );
            handle
                .child
                .kill()
                .and_then(|()| handle.child.wait())
                .map_err(|source| LifecycleError::Reap { pid, source })?;
        }
        Ok(StopOutcome::Forced { pid })
    }
}

fn shutdown_accepted(client: &dyn ManagementClient, pid: u32) -> bool {
    match request_shutdown(client) {
        Ok(true) => true,
        Ok(false) => {
            warn!(target: LIFECYCLE_TARGET, pid, "server declined shutdown request");
            false
        }
        Err(error) => {
            warn!(target: LIFECYCLE_TARGET, pid, %error, "shutdown request failed");
            false
        }
    }
}

fn interrupt(pid: u32) -> Result<(), LifecycleError> {
    let raw = i32::try_from(pid).map_err(|_| LifecycleError::InvalidPid { pid })?;
    debug!(target: LIFECYCLE_TARGET, pid, "sending SIGINT");
    match kill(Pid::from_raw(raw), Signal::SIGINT) {
        // Already gone; the reap below collects it.
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(source) => Err(LifecycleError::Signal { pid, source }),
    }
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(REAP_INTERVAL.min(deadline - now));
    }
}

/// Collects a process that outlived its stop, so it does not linger as a
/// zombie once it finally exits.
fn spawn_reaper(pid: u32, mut child: Child) {
    let spawned = thread::Builder::new()
        .name(String::from("server-reaper"))
        .spawn(move || match child.wait() {
            Ok(status) => info!(target: LIFECYCLE_TARGET, pid, %status, "server process reaped"),
            Err(error) => warn!(target: LIFECYCLE_TARGET, pid, %error, "failed to reap server"),
        });
    if let Err(error) = spawned {
        warn!(target: LIFECYCLE_TARGET, pid, %error, "failed to start reaper");
    }
}

fn spawn_drain<R>(stream: &'static str, pid: u32, reader: R)
where
    R: Read + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(format!("server-{stream}"))
        .spawn(move || drain(stream, pid, reader));
    if let Err(error) = spawned {
        warn!(target: LIFECYCLE_TARGET, pid, stream, %error, "failed to start output drain");
    }
}

fn drain(stream: &'static str, pid: u32, reader: impl Read) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                debug!(target: CONSOLE_TARGET, pid, stream, "{}", text.trim_end());
            }
            Err(error) => {
                debug!(target: CONSOLE_TARGET, pid, stream, %error, "output stream closed");
                break;
            }
        }
    }
}
