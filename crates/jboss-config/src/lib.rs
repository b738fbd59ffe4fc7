//! Shared configuration for the JBoss test fixture.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! TOML file (`--config-path` or `JBOSS_FIXTURE_CONFIG_PATH`), then
//! `JBOSS_FIXTURE_*` environment variables, then command-line flags. The
//! resulting [`Config`] is resolved once at startup and treated as read-only
//! by every lifecycle component.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_BOOT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_JBOSS_CONF, DEFAULT_JVM_ARGS,
    DEFAULT_LOG_FILTER, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, FALLBACK_JBOSS_HOME,
    default_host, default_jboss_conf, default_jboss_home, default_jvm_args, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use endpoint::{CONSOLE_PATH, EndpointError, ManagementEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Environment prefix applied to every configuration key.
pub const ENV_PREFIX: &str = "JBOSS_FIXTURE";

/// Process-wide settings for launching and managing the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "JBOSS_FIXTURE")]
pub struct Config {
    /// Management host and bind address (`-b`).
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// HTTP port of the JMX console.
    #[ortho_config(default = defaults::DEFAULT_PORT)]
    pub port: u16,
    /// JBoss installation directory.
    #[ortho_config(default = defaults::default_jboss_home())]
    pub jboss_home: Utf8PathBuf,
    /// Server configuration name (`-c`).
    #[ortho_config(default = defaults::default_jboss_conf())]
    pub jboss_conf: String,
    /// Java installation; `JAVA_HOME` and then `PATH` are consulted when unset.
    pub java_home: Option<Utf8PathBuf>,
    /// Extra JVM flags, separated by whitespace.
    #[ortho_config(default = defaults::default_jvm_args())]
    pub jvm_args: String,
    /// Reuse an already running server instead of starting and stopping one.
    #[ortho_config(default = false)]
    pub lazy: bool,
    /// Seconds `start` waits for the server to report ready.
    #[ortho_config(default = defaults::DEFAULT_BOOT_TIMEOUT_SECS)]
    pub boot_timeout_secs: u64,
    /// Upper bound on a single management call, in seconds.
    #[ortho_config(default = defaults::DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            jboss_home: default_jboss_home(),
            jboss_conf: default_jboss_conf(),
            java_home: None,
            jvm_args: default_jvm_args(),
            lazy: false,
            boot_timeout_secs: DEFAULT_BOOT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Management host and bind address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// HTTP port of the JMX console.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Endpoint that management requests are sent to.
    #[must_use]
    pub fn management_endpoint(&self) -> ManagementEndpoint {
        ManagementEndpoint::new(self.host.clone(), self.port)
    }

    /// JBoss installation directory.
    #[must_use]
    pub fn jboss_home(&self) -> &Utf8Path {
        &self.jboss_home
    }

    /// Server configuration name.
    #[must_use]
    pub fn jboss_conf(&self) -> &str {
        &self.jboss_conf
    }

    /// Explicitly configured Java installation, if any.
    #[must_use]
    pub fn java_home(&self) -> Option<&Utf8Path> {
        self.java_home.as_deref()
    }

    /// JVM flags split on whitespace.
    pub fn jvm_args(&self) -> impl Iterator<Item = &str> {
        self.jvm_args.split_whitespace()
    }

    /// Whether start and stop should leave an already running server alone.
    #[must_use]
    pub const fn lazy(&self) -> bool {
        self.lazy
    }

    /// How long `start` waits for readiness.
    #[must_use]
    pub const fn boot_timeout(&self) -> Duration {
        Duration::from_secs(self.boot_timeout_secs)
    }

    /// Bound applied to each management call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_targets_local_console() {
        let config = Config::default();
        let endpoint = config.management_endpoint();
        assert_eq!(endpoint.host(), DEFAULT_HOST);
        assert_eq!(endpoint.port(), DEFAULT_PORT);
    }

    #[test]
    fn jvm_args_split_on_whitespace() {
        let config = Config {
            jvm_args: String::from("  -Xmx512m\t-Dfoo=bar \n-server "),
            ..Config::default()
        };
        let args: Vec<&str> = config.jvm_args().collect();
        assert_eq!(args, ["-Xmx512m", "-Dfoo=bar", "-server"]);
    }

    #[test]
    fn timeouts_are_expressed_in_seconds() {
        let config = Config {
            boot_timeout_secs: 5,
            request_timeout_secs: 7,
            ..Config::default()
        };
        assert_eq!(config.boot_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(7));
    }
}
