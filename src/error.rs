//! Error types of the command-execution engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A line that can be tokenized but not turned into something runnable.
#[derive(Debug, Error)]
pub enum ParseError {
    /// `<` or `>` is the last token, so there is no path to redirect to.
    #[error("syntax error: `{0}` is missing a file name")]
    DanglingRedirect(String),
    /// Nothing is left to run once directives are stripped (e.g. `> out`).
    #[error("syntax error: no command to run")]
    MissingProgram,
    /// One side of `|` has no command.
    #[error("syntax error: empty command in pipeline")]
    EmptyPipelineStage,
    /// Only `left | right` is supported.
    #[error("syntax error: only two-stage pipelines are supported")]
    TooManyStages,
}

/// Failure to start (or wait for) an external program.
///
/// The message names what failed; the underlying I/O error is the source.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no command to run")]
    EmptyCommand,
    #[error("{}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to create process")]
    Spawn(#[source] io::Error),
    #[error("failed to wait for process")]
    Wait(#[source] io::Error),
    #[error("failed to create pipe")]
    Pipe(#[source] io::Error),
}

impl LaunchError {
    /// `program` could not be found on the search path.
    pub fn not_found(program: &str) -> Self {
        LaunchError::Exec {
            program: program.to_owned(),
            source: io::Error::new(io::ErrorKind::NotFound, "command not found"),
        }
    }

    /// Sort a `spawn` failure into "the program is bad" and "the system is out
    /// of something".
    pub fn from_spawn(program: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => LaunchError::Exec {
                program: program.to_owned(),
                source,
            },
            _ => LaunchError::Spawn(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_are_classified_by_kind() {
        let e = LaunchError::from_spawn("foo", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, LaunchError::Exec { ref program, .. } if program == "foo"));

        let e = LaunchError::from_spawn("foo", io::Error::from(io::ErrorKind::OutOfMemory));
        assert!(matches!(e, LaunchError::Spawn(_)));
    }

    #[test]
    fn not_found_message_names_the_program() {
        let e = anyhow::Error::from(LaunchError::not_found("doesnotexist123"));
        assert_eq!(format!("{e:#}"), "doesnotexist123: command not found");
    }

    #[test]
    fn redirect_message_names_the_path() {
        let e = LaunchError::Redirect {
            path: PathBuf::from("in.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            format!("{:#}", anyhow::Error::from(e)),
            "in.txt: No such file or directory"
        );
    }
}
