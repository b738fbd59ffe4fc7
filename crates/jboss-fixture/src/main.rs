//! Entry point for the `jboss-fixture` binary; see [`jboss_fixture::run`].

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: supervisor and signal threads log to stderr while
    // `run` blocks.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    jboss_fixture::run(std::env::args_os(), &mut stdout, &mut stderr)
}
