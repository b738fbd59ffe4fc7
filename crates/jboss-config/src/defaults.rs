use camino::Utf8PathBuf;
use std::env;

/// Default management host; also used as the server bind address.
pub const DEFAULT_HOST: &str = "localhost";

/// Default HTTP port of the JMX console.
pub const DEFAULT_PORT: u16 = 8080;

/// Installation directory used when neither the configuration nor
/// `JBOSS_HOME` names one.
pub const FALLBACK_JBOSS_HOME: &str = "/opt/jboss";

/// Default server configuration name passed to `-c`.
pub const DEFAULT_JBOSS_CONF: &str = "default";

/// Default JVM flags for a test server.
pub const DEFAULT_JVM_ARGS: &str =
    "-Xms64m -Xmx1024m -XX:MaxPermSize=256m -Djava.net.preferIPv4Stack=true";

/// Default number of seconds `start` waits for the server to boot.
pub const DEFAULT_BOOT_TIMEOUT_SECS: u64 = 180;

/// Default bound on a single management call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default management host.
pub fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Resolves the JBoss installation from `JBOSS_HOME`, falling back to
/// [`FALLBACK_JBOSS_HOME`].
pub fn default_jboss_home() -> Utf8PathBuf {
    env::var("JBOSS_HOME")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| Utf8PathBuf::from(FALLBACK_JBOSS_HOME), Utf8PathBuf::from)
}

/// Default server configuration name.
pub fn default_jboss_conf() -> String {
    DEFAULT_JBOSS_CONF.to_string()
}

/// Default JVM flags.
pub fn default_jvm_args() -> String {
    DEFAULT_JVM_ARGS.to_string()
}

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binary.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}
