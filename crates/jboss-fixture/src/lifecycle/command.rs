//! Server command-line construction.
//!
//! The production command runs `org.jboss.Main` from the configured JBoss
//! installation; tests and alternative launchers supply their own program.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use jboss_config::Config;

const MAIN_CLASS: &str = "org.jboss.Main";

/// Program and arguments used to launch the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl LaunchCommand {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds the JBoss boot command:
    /// `java -cp <home>/bin/run.jar <jvm args> -Djava.endorsed.dirs=<home>/lib/endorsed
    /// org.jboss.Main -c <conf> -b <host>`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let home = config.jboss_home();
        Self::new(java_binary(config))
            .arg("-cp")
            .arg(home.join("bin").join("run.jar").as_str())
            .args(config.jvm_args())
            .arg(format!(
                "-Djava.endorsed.dirs={}",
                home.join("lib").join("endorsed")
            ))
            .arg(MAIN_CLASS)
            .arg("-c")
            .arg(config.jboss_conf())
            .arg("-b")
            .arg(config.host())
    }

    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(formatter, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Resolves `java` from the configured home, then `JAVA_HOME`, then `PATH`.
fn java_binary(config: &Config) -> PathBuf {
    config
        .java_home()
        .map(|home| home.as_std_path().to_path_buf())
        .or_else(|| env::var_os("JAVA_HOME").map(PathBuf::from))
        .map_or_else(
            || PathBuf::from("java"),
            |home| home.join("bin").join("java"),
        )
}
