//! Lifecycle control for a JBoss application server used as an integration
//! test fixture.
//!
//! A test harness builds a [`Server`] from a [`jboss_config::Config`], calls
//! [`Server::start`] before its suite, deploys archives with
//! [`Server::deploy`], and calls [`Server::stop`] afterwards. All control goes
//! through the server's JMX console over HTTP ([`control`]); the launched JVM
//! is supervised directly ([`lifecycle`]).
//!
//! The same operations are available from the `jboss-fixture` binary through
//! [`run`].

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use jboss_config::Config;
use thiserror::Error;

mod cli;
mod config;
pub mod control;
pub mod lifecycle;
mod output;
pub mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub use control::{Artifact, ArtifactError, ControlError, HttpConsole, ManagementClient};
pub use lifecycle::{
    DeploymentReport, LaunchCommand, LifecycleError, Server, ServerSettings, StartOutcome,
    StopOutcome,
};
use output::CommandOutput;
use telemetry::TelemetryError;

/// Errors reported by the command-line runtime.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("server lifecycle command failed: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("failed to write output: {0}")]
    Output(std::io::Error),
}

/// Runs the CLI with the given arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let mut output = CommandOutput::new(&mut *stdout, &mut *stderr);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        // Help and version requests are not failures.
        Err(error) if !error.use_stderr() => {
            return match output.stdout_line(format_args!("{}", error.render())) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => return report_failure(&mut output, &AppError::CliUsage(error)),
    };

    let result = loader.load(&split.config_arguments).and_then(|config| {
        telemetry::initialise(&config)?;
        execute(&cli.command, &config, &mut output)
    });
    match result {
        Ok(exit_code) => exit_code,
        Err(error) => report_failure(&mut output, &error),
    }
}

fn report_failure<W: Write, E: Write>(
    output: &mut CommandOutput<W, E>,
    error: &AppError,
) -> ExitCode {
    // Nothing more can be reported if stderr itself is gone.
    let _ = output.stderr_line(format_args!("{error}"));
    ExitCode::FAILURE
}

fn execute<W: Write, E: Write>(
    command: &CliCommand,
    config: &Config,
    output: &mut CommandOutput<W, E>,
) -> Result<ExitCode, AppError> {
    let server = Server::from_config(config)?;
    match command {
        CliCommand::Status => {
            let state = if server.is_ready() { "ready" } else { "not ready" };
            output.stdout_line(format_args!(
                "server is {state} at {}",
                server.settings().endpoint
            ))?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Deploy { artifact } => {
            let report = server.deploy(artifact)?;
            report_deployment(output, &report)
        }
        CliCommand::Undeploy { artifact } => {
            let report = server.undeploy(artifact)?;
            report_deployment(output, &report)
        }
        CliCommand::Shutdown => {
            if server.request_shutdown()? {
                output.stdout_line(format_args!("server accepted shutdown"))?;
                Ok(ExitCode::SUCCESS)
            } else {
                output.stderr_line(format_args!("server declined shutdown"))?;
                Ok(ExitCode::FAILURE)
            }
        }
        CliCommand::Run { wait, deploy } => {
            let wait = wait.map_or(server.settings().boot_timeout, Duration::from_secs);
            run_server(&server, wait, deploy, output)
        }
    }
}

fn report_deployment<W: Write, E: Write>(
    output: &mut CommandOutput<W, E>,
    report: &DeploymentReport,
) -> Result<ExitCode, AppError> {
    if report.succeeded {
        output.stdout_line(format_args!("{report}"))?;
        Ok(ExitCode::SUCCESS)
    } else {
        output.stderr_line(format_args!("{report}"))?;
        Ok(ExitCode::FAILURE)
    }
}

fn run_server<C, W, E>(
    server: &Server<C>,
    wait: Duration,
    artifacts: &[Artifact],
    output: &mut CommandOutput<W, E>,
) -> Result<ExitCode, AppError>
where
    C: ManagementClient + 'static,
    W: Write,
    E: Write,
{
    let outcome = server.start(wait)?;
    output.stdout_line(format_args!("{outcome}"))?;

    let deployed = artifacts.iter().try_for_each(|artifact| {
        let report = server.deploy(artifact)?;
        output.stdout_line(format_args!("{report}"))
    });
    if let Err(error) = deployed {
        if let Err(stop_error) = server.stop() {
            let _ = output.stderr_line(format_args!("{stop_error}"));
        }
        return Err(error);
    }

    if outcome == StartOutcome::Skipped {
        return Ok(ExitCode::SUCCESS);
    }
    output.stderr_line(format_args!(
        "waiting for SIGINT, SIGTERM, SIGQUIT or SIGHUP to stop the server"
    ))?;
    server.wait_for_signal();
    match server.pid() {
        None => {
            output.stdout_line(format_args!("server stopped"))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(pid) => {
            output.stderr_line(format_args!("server pid {pid} is still running"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests;
