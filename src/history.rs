//! Record of the lines entered during a session.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Ordered, in-memory list of every non-empty line of the session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Everything recorded before the most recent entry.
    ///
    /// Lines are recorded before they are interpreted, so while a line runs
    /// it is already the last entry; this is what came before it.
    pub fn previous(&self) -> &[String] {
        let len = self.entries.len().saturating_sub(1);
        &self.entries[..len]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append-only log file of input lines.
///
/// Writing is best-effort: a log that cannot be opened or written to is
/// reported through `tracing` and otherwise ignored.
#[derive(Debug, Default)]
pub struct SessionLog {
    file: Option<File>,
}

impl SessionLog {
    /// Open `path` for appending, creating it if necessary.
    pub fn open(path: &Path) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                debug!(path = %path.display(), "session log opened");
                Self { file: Some(file) }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open session log");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Append `line` followed by a newline.
    pub fn append(&mut self, line: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            warn!(error = %e, "cannot write to session log");
        }
    }
}
