//! Background processes started by the interpreter.
//!
//! Children launched with a trailing `&` are kept here and polled before each
//! prompt so finished ones are reaped instead of lingering as zombies.

use crate::command::ExitCode;
use crate::external::exit_code;
use std::fmt;
use std::io;
use std::process::{Child, ExitStatus};
use tracing::{debug, warn};

struct Job {
    child: Child,
    command: String,
}

/// A background process that has terminated and been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub pid: u32,
    pub code: ExitCode,
    pub command: String,
}

impl fmt::Display for Finished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Done ({}) {}", self.pid, self.code, self.command)
    }
}

impl Job {
    /// Turn the result of a status poll into a reaped job, if it has one.
    ///
    /// A job that is still running, or whose status could not be read, stays
    /// in the table and is polled again later.
    fn settle(&mut self, polled: io::Result<Option<ExitStatus>>) -> Option<Finished> {
        let pid = self.child.id();
        match polled {
            Ok(Some(status)) => {
                let code = exit_code(status);
                debug!(pid, code, "background job finished");
                Some(Finished {
                    pid,
                    code,
                    command: std::mem::take(&mut self.command),
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(pid, error = %e, "cannot poll background job, will retry");
                None
            }
        }
    }
}

#[derive(Default)]
pub struct BackgroundJobs {
    jobs: Vec<Job>,
}

impl BackgroundJobs {
    /// Take ownership of a running child. Returns its process identifier.
    pub fn adopt(&mut self, child: Child, command: impl Into<String>) -> u32 {
        let pid = child.id();
        self.jobs.push(Job {
            child,
            command: command.into(),
        });
        pid
    }

    /// Collect every job that has terminated since the last call.
    ///
    /// Never blocks.
    pub fn reap(&mut self) -> Vec<Finished> {
        let mut finished = Vec::new();
        self.jobs.retain_mut(|job| {
            let polled = job.child.try_wait();
            match job.settle(polled) {
                Some(done) => {
                    finished.push(done);
                    false
                }
                None => true,
            }
        });
        finished
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
