//! Error types for server lifecycle operations.

use std::io;
use std::time::Duration;

use nix::errno::Errno;
use thiserror::Error;

use crate::control::ControlError;

/// Errors raised while starting, supervising or stopping the server.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("server is already running at {endpoint}; stop it or enable lazy mode")]
    AlreadyRunning { endpoint: String },
    #[error("server pid {pid} is already supervised by this controller")]
    AlreadySupervised { pid: u32 },
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "server failed to start within {}s (waited {}ms)",
        .timeout.as_secs(),
        .elapsed.as_millis()
    )]
    StartupTimeout { elapsed: Duration, timeout: Duration },
    #[error("server process exited after {}ms without reporting ready", .elapsed.as_millis())]
    ProcessExited { elapsed: Duration },
    #[error("start interrupted by a termination signal")]
    Interrupted,
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("pid {pid} cannot be signalled on this platform")]
    InvalidPid { pid: u32 },
    #[error("failed to signal server pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: Errno,
    },
    #[error("failed to install signal handlers: {source}")]
    SignalInstall {
        #[source]
        source: io::Error,
    },
    #[error("failed to reap server pid {pid}: {source}")]
    Reap {
        pid: u32,
        #[source]
        source: io::Error,
    },
}
