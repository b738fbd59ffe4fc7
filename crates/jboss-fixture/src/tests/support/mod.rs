//! Shared harness for crate-level tests.

mod fake_console;

use std::ffi::OsString;
use std::time::Duration;

use jboss_config::{Config, ManagementEndpoint};

use crate::AppError;
use crate::config::ConfigLoader;
use crate::lifecycle::{LaunchCommand, ServerSettings};

pub(crate) use fake_console::{ConsoleReply, FakeConsole, RecordedCall};

/// Loader that ignores the command line and returns a fixed configuration.
pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Settings that launch `sleep 30` and keep polling and shutdown short.
pub(crate) fn sleeper_settings(endpoint: ManagementEndpoint) -> ServerSettings {
    ServerSettings {
        poll_interval: Duration::from_millis(10),
        shutdown_timeout: Duration::from_secs(2),
        handle_signals: false,
        ..ServerSettings::new(LaunchCommand::new("sleep").arg("30"), endpoint)
    }
}
