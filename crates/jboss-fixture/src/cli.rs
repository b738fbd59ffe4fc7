//! Command-line definitions for the `jboss-fixture` binary.

use clap::{Parser, Subcommand};

use crate::control::Artifact;

/// Starts, stops and deploys to a JBoss server for integration tests.
///
/// Configuration flags (`--host`, `--port`, `--jboss-home`, ...) must come
/// before the command.
#[derive(Parser, Debug)]
#[command(name = "jboss-fixture", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Reports whether a server answers at the configured endpoint.
    Status,
    /// Deploys an archive, given as a URL or a filesystem path.
    Deploy {
        #[arg(value_name = "ARTIFACT")]
        artifact: Artifact,
    },
    /// Undeploys an archive previously deployed from the same location.
    Undeploy {
        #[arg(value_name = "ARTIFACT")]
        artifact: Artifact,
    },
    /// Asks the running server to shut down cleanly.
    Shutdown,
    /// Starts the server, deploys artifacts and stops it on SIGINT, SIGTERM,
    /// SIGQUIT or SIGHUP.
    Run {
        /// Seconds to wait for readiness; defaults to `boot_timeout_secs`.
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
        /// Artifacts to deploy once the server is ready.
        #[arg(long = "deploy", value_name = "ARTIFACT")]
        deploy: Vec<Artifact>,
    },
}
