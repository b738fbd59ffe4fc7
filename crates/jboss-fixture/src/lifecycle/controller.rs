//! Start, stop and deployment orchestration.
//!
//! [`Server`] is the entry point a test harness drives from its setup and
//! teardown hooks. It owns the supervised process, the management client and
//! the signal routing for one server instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jboss_config::{Config, ManagementEndpoint};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use super::LIFECYCLE_TARGET;
use super::command::LaunchCommand;
use super::error::LifecycleError;
use super::readiness::{POLL_INTERVAL, ReadinessMonitor, probe_ready};
use super::signals::SignalGuard;
use super::supervisor::{SHUTDOWN_TIMEOUT, Supervisor};
use super::types::{DeploymentReport, StartOutcome, StopOutcome};
use crate::control::{
    Artifact, DeploymentAction, HttpConsole, JmxConsoleStatus, ManagementClient, StatusParser,
    invoke_deployer, request_shutdown,
};

/// How a [`Server`] launches and supervises its process.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Process to spawn on start.
    pub command: LaunchCommand,
    /// Console used for readiness, deployment and shutdown.
    pub endpoint: ManagementEndpoint,
    /// Reuse a running server and never stop it.
    pub lazy: bool,
    /// Readiness wait used when the caller has no preference.
    pub boot_timeout: Duration,
    /// Pause between readiness probes.
    pub poll_interval: Duration,
    /// How long a stopping server may take to exit.
    pub shutdown_timeout: Duration,
    /// Stop the server when the host process receives a termination signal.
    pub handle_signals: bool,
}

impl ServerSettings {
    /// Settings with the default timeouts and signal routing on.
    #[must_use]
    pub fn new(command: LaunchCommand, endpoint: ManagementEndpoint) -> Self {
        Self {
            command,
            endpoint,
            lazy: false,
            boot_timeout: Duration::from_secs(jboss_config::DEFAULT_BOOT_TIMEOUT_SECS),
            poll_interval: POLL_INTERVAL,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            handle_signals: true,
        }
    }

    /// Settings derived from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            lazy: config.lazy(),
            boot_timeout: config.boot_timeout(),
            ..Self::new(
                LaunchCommand::from_config(config),
                config.management_endpoint(),
            )
        }
    }
}

/// Lifecycle controller for one JBoss server.
pub struct Server<C: ManagementClient + 'static = HttpConsole> {
    settings: ServerSettings,
    client: Arc<C>,
    parser: Arc<dyn StatusParser>,
    supervisor: Arc<Supervisor>,
    signals: OnceCell<SignalGuard>,
}

impl Server<HttpConsole> {
    /// Wires the HTTP console and the configured launch command.
    ///
    /// # Errors
    ///
    /// Fails when the console URL or HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, LifecycleError> {
        let settings = ServerSettings::from_config(config);
        let client = HttpConsole::new(&settings.endpoint, config.request_timeout())?;
        Ok(Self::new(settings, client))
    }
}

impl<C: ManagementClient + 'static> Server<C> {
    /// Controller using `client` for every console call.
    #[must_use]
    pub fn new(settings: ServerSettings, client: C) -> Self {
        let supervisor = Arc::new(Supervisor::new(settings.shutdown_timeout));
        Self {
            settings,
            client: Arc::new(client),
            parser: Arc::new(JmxConsoleStatus),
            supervisor,
            signals: OnceCell::new(),
        }
    }

    /// Replaces the readiness parser, for consoles that render status
    /// differently.
    #[must_use]
    pub fn with_status_parser(mut self, parser: impl StatusParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Settings this controller was built with.
    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Pid of the process this controller launched, while it is supervised.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    /// Whether the console reports the server as started. Failures to reach
    /// or parse the console read as `false`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        probe_ready(self.client.as_ref(), self.parser.as_ref())
    }

    /// Launches the server and waits up to `wait` for it to report ready.
    ///
    /// A zero `wait` returns as soon as the process is spawned. If the wait
    /// fails the launched process is stopped before the error is returned.
    /// Each launch re-arms signal routing, so a server restarted on the same
    /// controller is still stopped by the next termination signal.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] when a server already
    /// answers at the endpoint and lazy mode is off, and the launch or
    /// readiness errors otherwise.
    pub fn start(&self, wait: Duration) -> Result<StartOutcome, LifecycleError> {
        if self.is_ready() {
            if self.settings.lazy {
                info!(
                    target: LIFECYCLE_TARGET,
                    endpoint = %self.settings.endpoint,
                    "server already running; reusing it"
                );
                return Ok(StartOutcome::Skipped);
            }
            return Err(LifecycleError::AlreadyRunning {
                endpoint: self.settings.endpoint.to_string(),
            });
        }

        info!(
            target: LIFECYCLE_TARGET,
            command = %self.settings.command,
            wait_secs = wait.as_secs(),
            "starting server"
        );
        // Armed before spawning, so a signal never finds an unguarded process.
        let guard = self.route_signals()?;
        let pid = match self.supervisor.launch(&self.settings.command) {
            Ok(pid) => pid,
            Err(error) => {
                // A process already held keeps its routing.
                let held = matches!(error, LifecycleError::AlreadySupervised { .. });
                if let Some(guard) = guard.filter(|_| !held) {
                    guard.disarm();
                }
                return Err(error);
            }
        };
        let result = if guard.is_some_and(|guard| !guard.is_armed()) {
            Err(LifecycleError::Interrupted)
        } else {
            self.await_ready(wait)
        };
        result.inspect_err(|error| self.abandon_start(pid, error))
    }

    /// Installs signal routing on first use and arms it for the next launch.
    fn route_signals(&self) -> Result<Option<&SignalGuard>, LifecycleError> {
        if !self.settings.handle_signals {
            return Ok(None);
        }
        let guard = self.signals.get_or_try_init(|| {
            let supervisor = Arc::clone(&self.supervisor);
            let client = Arc::clone(&self.client);
            let lazy = self.settings.lazy;
            SignalGuard::install(move || {
                if let Err(error) = stop_server(&supervisor, client.as_ref(), lazy) {
                    warn!(target: LIFECYCLE_TARGET, %error, "signal-triggered stop failed");
                }
            })
        })?;
        guard.arm();
        Ok(Some(guard))
    }

    fn disarm_signals(&self) {
        if let Some(guard) = self.signals.get() {
            guard.disarm();
        }
    }

    fn await_ready(&self, wait: Duration) -> Result<StartOutcome, LifecycleError> {
        ReadinessMonitor::new(
            self.client.as_ref(),
            self.parser.as_ref(),
            &self.supervisor,
        )
        .with_interval(self.settings.poll_interval)
        .await_ready(wait)
    }

    fn abandon_start(&self, pid: u32, cause: &LifecycleError) {
        warn!(target: LIFECYCLE_TARGET, pid, error = %cause, "start failed; stopping server");
        if let Err(error) = self.supervisor.terminate(self.client.as_ref(), false) {
            warn!(target: LIFECYCLE_TARGET, pid, %error, "failed to stop server after failed start");
        }
        self.disarm_signals();
    }

    /// Deploys `artifact` through the main deployer.
    ///
    /// # Errors
    ///
    /// Only transport failures are raised; a declined deployment is reported
    /// through [`DeploymentReport::succeeded`].
    pub fn deploy(&self, artifact: &Artifact) -> Result<DeploymentReport, LifecycleError> {
        self.run_deployer(DeploymentAction::Deploy, artifact)
    }

    /// Undeploys `artifact` through the main deployer.
    ///
    /// # Errors
    ///
    /// Same contract as [`Server::deploy`].
    pub fn undeploy(&self, artifact: &Artifact) -> Result<DeploymentReport, LifecycleError> {
        self.run_deployer(DeploymentAction::Undeploy, artifact)
    }

    fn run_deployer(
        &self,
        action: DeploymentAction,
        artifact: &Artifact,
    ) -> Result<DeploymentReport, LifecycleError> {
        info!(target: LIFECYCLE_TARGET, %action, %artifact, "invoking deployer");
        let started = Instant::now();
        let succeeded = invoke_deployer(self.client.as_ref(), action, artifact)?;
        let report = DeploymentReport {
            action,
            artifact: artifact.clone(),
            succeeded,
            elapsed: started.elapsed(),
        };
        if succeeded {
            info!(target: LIFECYCLE_TARGET, elapsed_ms = report.elapsed.as_millis(), "{report}");
        } else {
            warn!(target: LIFECYCLE_TARGET, elapsed_ms = report.elapsed.as_millis(), "{report}");
        }
        Ok(report)
    }

    /// Stops the launched server: cleanly through the console when possible,
    /// by interrupt otherwise. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Fails only when the process cannot be signalled or reaped.
    pub fn stop(&self) -> Result<StopOutcome, LifecycleError> {
        let outcome = stop_server(&self.supervisor, self.client.as_ref(), self.settings.lazy)?;
        self.disarm_signals();
        Ok(outcome)
    }

    /// Asks whatever server answers at the endpoint to shut down, whether or
    /// not this controller launched it. Returns whether it accepted.
    ///
    /// # Errors
    ///
    /// Returns the transport failure when the console cannot be reached.
    pub fn request_shutdown(&self) -> Result<bool, LifecycleError> {
        Ok(request_shutdown(self.client.as_ref())?)
    }

    /// Blocks until a termination signal has stopped the launched server, or
    /// until it is stopped some other way. Returns `false` immediately when
    /// no signal routing is installed.
    pub fn wait_for_signal(&self) -> bool {
        self.signals.get().is_some_and(|guard| {
            guard.wait();
            true
        })
    }
}

fn stop_server(
    supervisor: &Supervisor,
    client: &dyn ManagementClient,
    lazy: bool,
) -> Result<StopOutcome, LifecycleError> {
    if lazy {
        info!(target: LIFECYCLE_TARGET, "lazy mode; leaving server running");
        return Ok(StopOutcome::Skipped);
    }
    supervisor.terminate(client, true)
}
