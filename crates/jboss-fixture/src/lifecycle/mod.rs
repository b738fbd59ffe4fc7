//! Server lifecycle management.
//!
//! - [`command`] builds the launch command line.
//! - [`supervisor`] owns the launched process and tears it down.
//! - [`readiness`] polls the console until the server reports it has started.
//! - [`signals`] stops the server when the host process is told to exit.
//! - [`controller`] ties these together behind [`Server`].

mod command;
mod controller;
mod error;
mod readiness;
mod signals;
mod supervisor;
mod types;

#[cfg(test)]
mod controller_tests;

pub use command::LaunchCommand;
pub use controller::{Server, ServerSettings};
pub use error::LifecycleError;
pub use readiness::{POLL_INTERVAL, ReadinessMonitor};
pub use signals::{STOP_SIGNALS, SignalGuard};
pub use supervisor::{SHUTDOWN_TIMEOUT, Supervisor};
pub use types::{DeploymentReport, StartOutcome, StopOutcome};

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::lifecycle");
