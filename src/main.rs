use argh::FromArgs;
use mysh::Interpreter;
use mysh::config::ShellConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A small interactive shell with pipes, redirection and background jobs.
struct Options {
    #[argh(option, default = "String::from(\"mysh> \")")]
    /// prompt printed before every line
    prompt: String,

    #[argh(option, default = "PathBuf::from(\"shell_log.txt\")")]
    /// file every input line is appended to
    log_file: PathBuf,

    #[argh(switch)]
    /// do not keep a log file
    no_log: bool,

    #[argh(option, default = "String::from(\"g++\")")]
    /// compiler used by `runcpp`
    compiler: String,

    #[argh(option, default = "PathBuf::from(\"compile_errors.txt\")")]
    /// file that receives compiler diagnostics for `runcpp`
    diagnostics_file: PathBuf,
}

impl From<Options> for ShellConfig {
    fn from(options: Options) -> Self {
        ShellConfig {
            prompt: options.prompt,
            log_file: (!options.no_log).then_some(options.log_file),
            compiler: options.compiler,
            diagnostics_file: options.diagnostics_file,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("MYSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let options: Options = argh::from_env();
    let mut interpreter = Interpreter::with_config(options.into());
    interpreter.repl()?;
    Ok(())
}
