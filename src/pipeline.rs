//! Two commands connected by one pipe.

use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::LaunchError;
use crate::external::{prepare, wait};
use crate::lexer::tokenize;
use std::io;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// How each stage of a pipeline ended.
///
/// The stages fail independently; one not starting does not stop the other.
#[derive(Debug)]
pub struct PipelineReport {
    pub upstream: Result<ExitCode, LaunchError>,
    pub downstream: Result<ExitCode, LaunchError>,
}

impl PipelineReport {
    /// Failures of both stages, upstream first.
    pub fn errors(self) -> impl Iterator<Item = LaunchError> {
        [self.upstream, self.downstream]
            .into_iter()
            .filter_map(Result::err)
    }
}

/// Run `left | right` and wait for both stages.
///
/// Each segment is only split on whitespace: redirections and `&` have no
/// special meaning inside a pipeline. The downstream stage writes to the
/// interpreter's standard output.
pub fn launch_pipeline(
    left: &str,
    right: &str,
    env: &Environment,
) -> Result<PipelineReport, LaunchError> {
    connect(left, right, env, Stdio::inherit())
}

/// [`launch_pipeline`] with the downstream stage writing to `sink`.
pub(crate) fn connect(
    left: &str,
    right: &str,
    env: &Environment,
    sink: Stdio,
) -> Result<PipelineReport, LaunchError> {
    let (reader, writer) = io::pipe().map_err(LaunchError::Pipe)?;

    // Each end moves into its stage's command and is closed in this process
    // once that command is gone, whether or not the stage started.
    let upstream = spawn_stage(&tokenize(left), env, |cmd| {
        cmd.stdout(writer);
    });
    let downstream = spawn_stage(&tokenize(right), env, |cmd| {
        cmd.stdin(reader).stdout(sink);
    });

    Ok(PipelineReport {
        upstream: upstream.and_then(|mut child| wait(&mut child)),
        downstream: downstream.and_then(|mut child| wait(&mut child)),
    })
}

fn spawn_stage(
    argv: &[String],
    env: &Environment,
    configure: impl FnOnce(&mut Command),
) -> Result<Child, LaunchError> {
    let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;
    let mut command = prepare(program, args, env)?;
    configure(&mut command);
    let child = command
        .spawn()
        .map_err(|e| LaunchError::from_spawn(program, e))?;
    debug!(pid = child.id(), %program, "pipeline stage spawned");
    Ok(child)
}
