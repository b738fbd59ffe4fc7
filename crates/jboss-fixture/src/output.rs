//! Line-oriented writers for command results.

use std::fmt;
use std::io::Write;

use crate::AppError;

/// Borrowed stdout/stderr pair; every line is flushed as it is written so
/// progress shows up while `run` blocks.
pub(crate) struct CommandOutput<W: Write, E: Write> {
    stdout: W,
    stderr: E,
}

impl<W: Write, E: Write> CommandOutput<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        write_line(&mut self.stdout, args)
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        write_line(&mut self.stderr, args)
    }
}

fn write_line(sink: &mut impl Write, args: fmt::Arguments<'_>) -> Result<(), AppError> {
    sink.write_fmt(args).map_err(AppError::Output)?;
    sink.write_all(b"\n").map_err(AppError::Output)?;
    sink.flush().map_err(AppError::Output)
}
