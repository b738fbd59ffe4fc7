//! Configuration loading for the `jboss-fixture` binary.
//!
//! Leading configuration flags go to `ortho_config`; everything from the first
//! unrecognised token onwards is the command line parsed by `clap`.

use std::ffi::{OsStr, OsString};

use jboss_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// Flags accepted by the configuration loader, with whether each takes a
/// value. Keep in sync with the fields of [`Config`].
const CONFIG_CLI_FLAGS: &[(&str, bool)] = &[
    ("--config-path", true),
    ("--host", true),
    ("--port", true),
    ("--jboss-home", true),
    ("--jboss-conf", true),
    ("--java-home", true),
    ("--jvm-args", true),
    ("--boot-timeout-secs", true),
    ("--request-timeout-secs", true),
    ("--log-filter", true),
    ("--log-format", true),
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered argument list (program name
    /// first).
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    CONFIG_CLI_FLAGS
        .iter()
        .find(|(known, _)| *known == flag)
        .map_or(FlagAction::Stop, |(_, takes_value)| FlagAction::Include {
            needs_value: *takes_value && !inline_value,
        })
}

/// Arguments split between the configuration loader and the command parser.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits `args` at the first token that is not a configuration flag. The
/// program name is copied to both halves.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_arguments = vec![program.clone()];
    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value {
                    if let Some(value) = remaining.next() {
                        config_arguments.push(value.clone());
                    }
                }
            }
            FlagAction::Stop => {
                command_arguments.push(argument.clone());
                command_arguments.extend(remaining.by_ref().cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
