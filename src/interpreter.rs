use crate::command::CommandFactory;
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::{LaunchOutcome, launch};
use crate::history::SessionLog;
use crate::jobs::BackgroundJobs;
use crate::lexer::tokenize;
use crate::parser::{extract, split_pipeline};
use crate::pipeline::launch_pipeline;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-ins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Whether the interactive loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// An interactive interpreter that runs built-in verbs, external programs
/// and two-stage pipelines.
///
/// The interpreter owns the session: the [`Environment`] (including the
/// in-memory history), the append-only log file and the table of background
/// jobs. Built-ins are looked up by name in a table of [`CommandFactory`]
/// objects; see [`Default`] for the verbs included out of the box.
///
/// Example
/// ```
/// use mysh::config::ShellConfig;
/// use mysh::{Flow, Interpreter};
///
/// let config = ShellConfig { log_file: None, ..ShellConfig::default() };
/// let mut sh = Interpreter::with_config(config);
/// let mut out = Vec::new();
/// let flow = sh.execute_line("calc 2 3", &mut out, &mut std::io::sink());
/// assert_eq!(flow, Flow::Continue);
/// assert_eq!(out, b"Result: 5\n");
/// ```
pub struct Interpreter {
    env: Environment,
    log: SessionLog,
    jobs: BackgroundJobs,
    commands: BTreeMap<&'static str, Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with a custom set of built-ins.
    ///
    /// When two factories share a name, the later one wins.
    pub fn new(config: ShellConfig, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        let log = match &config.log_file {
            Some(path) => SessionLog::open(path),
            None => SessionLog::disabled(),
        };
        Self {
            env: Environment::with_config(config),
            log,
            jobs: BackgroundJobs::default(),
            commands: commands.into_iter().map(|f| (f.name(), f)).collect(),
        }
    }

    /// Create an interpreter with the default built-ins.
    pub fn with_config(config: ShellConfig) -> Self {
        Self::new(config, default_commands())
    }

    /// Interpret one input line.
    ///
    /// Blank lines are ignored. Anything else is recorded in the history and
    /// the session log before it is interpreted, even if it then fails.
    /// Built-in output goes to `stdout`; failures are reported on `stderr`
    /// and never end the session.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        self.env.history.push(line);
        self.log.append(line);

        if let Err(e) = self.dispatch(line, stdout, stderr) {
            let _ = writeln!(stderr, "mysh: {e:#}");
        }

        if self.env.should_exit {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }

    fn dispatch(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<()> {
        if let Some(stages) = split_pipeline(line) {
            let (left, right) = stages?;
            stdout.flush()?;
            let report = launch_pipeline(left, right, &self.env)?;
            for e in report.errors() {
                writeln!(stderr, "mysh: {:#}", anyhow::Error::from(e))?;
            }
            return Ok(());
        }

        let tokens = tokenize(line);
        let Some((name, args)) = tokens.split_first() else {
            return Ok(());
        };

        if let Some(factory) = self.commands.get(name.as_str()) {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let code = factory.create(&args).execute(stdout, &mut self.env)?;
            debug!(verb = %name, code, "builtin finished");
            return Ok(());
        }

        let request = extract(tokens)?;
        stdout.flush()?;
        match launch(&request, &self.env)? {
            LaunchOutcome::Exited(code) => debug!(code, "foreground command finished"),
            LaunchOutcome::Background(child) => {
                let pid = self.jobs.adopt(child, line.trim());
                writeln!(stdout, "Started in background. PID: {pid}")?;
            }
        }
        Ok(())
    }

    /// Reap finished background jobs and announce them on `stdout`.
    pub fn report_finished_jobs(&mut self, stdout: &mut dyn Write) {
        for finished in self.jobs.reap() {
            let _ = writeln!(stdout, "{finished}");
        }
    }

    /// Read-Eval-Print Loop.
    ///
    /// Runs until `exit` or end of input. Ctrl-C just discards the current line.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            self.report_finished_jobs(&mut io::stdout());
            match rl.readline(&self.env.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let flow = self.execute_line(&line, &mut io::stdout(), &mut io::stderr());
                    if flow == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    debug!("end of input");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}

/// Built-ins: `greet`, `help`, `calc`, `repeat`, `history`, `runcpp`, `cd`, `exit`.
fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    vec![
        Box::new(Factory::<Greet>::default()),
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Calc>::default()),
        Box::new(Factory::<Repeat>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<RunCpp>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}
