use crate::config::ShellConfig;
use crate::history::History;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable session state visible to built-ins and launched programs.
///
/// The environment contains:
/// - `vars`: environment variables handed to every external program.
/// - `current_dir`: the working directory for command execution.
/// - `should_exit`: set by `exit`; the interactive loop stops once it is true.
/// - `history`: every non-empty line of the session, oldest first.
/// - `config`: the settings the session was started with.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub history: History,
    pub config: ShellConfig,
}

impl Environment {
    /// Capture the current process state with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// Capture the current process state.
    ///
    /// Copies variables from `std::env::vars()` and `current_dir` from
    /// `std::env::current_dir()`.
    pub fn with_config(config: ShellConfig) -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
            history: History::default(),
            config,
        }
    }

    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
