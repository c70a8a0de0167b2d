use std::path::PathBuf;

/// Session settings chosen at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed before every read.
    pub prompt: String,
    /// Where every non-empty input line is appended. `None` disables the log.
    pub log_file: Option<PathBuf>,
    /// Compiler invoked by `runcpp`.
    pub compiler: String,
    /// File that receives the compiler's diagnostics.
    pub diagnostics_file: PathBuf,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "mysh> ".to_owned(),
            log_file: Some(PathBuf::from("shell_log.txt")),
            compiler: "g++".to_owned(),
            diagnostics_file: PathBuf::from("compile_errors.txt"),
        }
    }
}
