//! Results reported by lifecycle operations.

use std::fmt;
use std::time::Duration;

use crate::control::{Artifact, DeploymentAction};

/// Result of [`Server::start`](super::Server::start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The server was launched and reported ready.
    Ready { pid: u32, elapsed: Duration },
    /// The server was launched without waiting for readiness.
    Launched { pid: u32 },
    /// Lazy mode found a running server and left it alone.
    Skipped,
}

impl StartOutcome {
    /// Pid of the launched process, if one was launched.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::Ready { pid, .. } | Self::Launched { pid } => Some(*pid),
            Self::Skipped => None,
        }
    }
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { pid, elapsed } => write!(
                formatter,
                "server pid {pid} started in {}s",
                elapsed.as_secs()
            ),
            Self::Launched { pid } => write!(formatter, "server pid {pid} launched"),
            Self::Skipped => formatter.write_str("lazy mode: reusing running server"),
        }
    }
}

/// Result of stopping the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The server accepted a clean shutdown.
    Stopped { pid: u32 },
    /// The clean path failed and the process was interrupted.
    Forced { pid: u32 },
    /// No process was supervised.
    NotRunning,
    /// Lazy mode left the server running.
    Skipped,
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped { pid } => write!(formatter, "server pid {pid} stopped"),
            Self::Forced { pid } => write!(formatter, "server pid {pid} stopped (forced)"),
            Self::NotRunning => formatter.write_str("server is not running"),
            Self::Skipped => formatter.write_str("lazy mode: leaving server running"),
        }
    }
}

/// Result of a deploy or undeploy call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub action: DeploymentAction,
    pub artifact: Artifact,
    /// Whether the server confirmed the operation.
    pub succeeded: bool,
    pub elapsed: Duration,
}

impl fmt::Display for DeploymentReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.action, self.succeeded) {
            (DeploymentAction::Deploy, true) => write!(
                formatter,
                "deployed {} in {}s",
                self.artifact,
                self.elapsed.as_secs()
            ),
            (DeploymentAction::Undeploy, true) => {
                write!(formatter, "undeployed {}", self.artifact.file_name())
            }
            (DeploymentAction::Deploy, false) => {
                write!(formatter, "failed to deploy {}", self.artifact)
            }
            (DeploymentAction::Undeploy, false) => {
                write!(formatter, "failed to undeploy {}", self.artifact.file_name())
            }
        }
    }
}
