use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Object-safe trait for a command that runs inside the interpreter process.
///
/// Implemented for every built-in through a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command, writing its output to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Creates commands for one verb.
///
/// The interpreter keys its dispatch table on [`CommandFactory::name`].
pub trait CommandFactory {
    /// The verb this factory answers to, e.g. "cd".
    fn name(&self) -> &'static str;

    /// Build a command instance from the arguments following the verb.
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}
