use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::external::{prepare, wait};
use crate::interpreter::Factory;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "calc" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e:#}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::from_args(&[T::name()], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

#[derive(FromArgs)]
/// Print a greeting.
pub struct Greet {}

impl BuiltinCommand for Greet {
    fn name() -> &'static str {
        "greet"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "👋 Hello! Welcome to your custom OOP-based shell!")?;
        Ok(0)
    }
}

const HELP: &str = "\
Available commands:
  greet                - Greeting message
  calc a b             - Add two numbers
  repeat <msg>         - Repeat your message
  history              - Show command history
  runcpp <file.cpp>    - Compile and run C++ code
  cd <path>            - Change directory
  Pipes                - e.g., ls | grep txt
  Redirection          - < input.txt, > output.txt
  Background           - Run with & (e.g., sleep 5 &)
  exit                 - Exit the shell
";

#[derive(FromArgs)]
/// List the available commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        stdout.write_all(HELP.as_bytes())?;
        Ok(0)
    }
}

/// Add two integers.
///
/// Operands are taken as typed, so `calc -7 3` adds a negative number instead
/// of reading `-7` as a flag.
pub struct Calc {
    pub lhs: String,
    pub rhs: String,
}

#[derive(FromArgs)]
/// Add two integers.
struct CalcUsage {
    #[argh(positional)]
    /// first operand
    lhs: String,

    #[argh(positional)]
    /// second operand
    rhs: String,
}

impl FromArgs for Calc {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        if let [lhs, rhs] = args {
            return Ok(Calc {
                lhs: lhs.to_string(),
                rhs: rhs.to_string(),
            });
        }
        // wrong arity and `--help` get argh's usage text
        CalcUsage::from_args(command_name, args).map(|CalcUsage { lhs, rhs }| Calc { lhs, rhs })
    }
}

impl BuiltinCommand for Calc {
    fn name() -> &'static str {
        "calc"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let (Ok(a), Ok(b)) = (self.lhs.parse::<i64>(), self.rhs.parse::<i64>()) else {
            bail!("Invalid numbers");
        };
        let Some(sum) = a.checked_add(b) else {
            bail!("calc: result out of range");
        };
        writeln!(stdout, "Result: {sum}")?;
        Ok(0)
    }
}

/// Print the arguments back, separated by spaces.
///
/// Every word is echoed as given; `-n`, `--help` and `help` are not options here.
pub struct Repeat {
    pub words: Vec<String>,
}

impl FromArgs for Repeat {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Repeat {
            words: args.iter().map(|word| word.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Repeat {
    fn name() -> &'static str {
        "repeat"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.words.join(" "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show the lines entered before this one.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for (i, line) in env.history.previous().iter().enumerate() {
            writeln!(stdout, "{}: {}", i + 1, line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Compile a source file and run the result.
pub struct RunCpp {
    #[argh(positional)]
    /// source file to compile; the binary is written next to it with an `.out` extension
    pub source: String,
}

impl RunCpp {
    fn compile(&self, binary: &Path, env: &Environment) -> Result<bool> {
        let diagnostics_path = env.current_dir.join(&env.config.diagnostics_file);
        let diagnostics = File::create(&diagnostics_path)
            .with_context(|| format!("runcpp: can't create {}", diagnostics_path.display()))?;
        let status = Command::new(&env.config.compiler)
            .arg(&self.source)
            .arg("-o")
            .arg(binary)
            .stderr(diagnostics)
            .current_dir(&env.current_dir)
            .status()
            .with_context(|| format!("runcpp: can't run {}", env.config.compiler))?;
        Ok(status.success())
    }
}

impl BuiltinCommand for RunCpp {
    fn name() -> &'static str {
        "runcpp"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let binary = Path::new(&self.source).with_extension("out");

        if !self.compile(&binary, env)? {
            let diagnostics_path = env.current_dir.join(&env.config.diagnostics_file);
            let captured = fs::read_to_string(&diagnostics_path)
                .with_context(|| format!("runcpp: can't read {}", diagnostics_path.display()))?;
            writeln!(stdout, "❌ Compilation failed:")?;
            for line in captured.lines() {
                writeln!(stdout, "{line}")?;
            }
            return Ok(1);
        }

        writeln!(stdout, "✅ Running {}...", binary.display())?;
        stdout.flush()?;

        // a bare file name would otherwise be looked up on PATH
        let program = if binary.components().count() == 1 {
            Path::new(".").join(&binary)
        } else {
            binary
        };
        let mut child = prepare(&program.to_string_lossy(), &[], env)?
            .spawn()
            .with_context(|| format!("runcpp: can't run {}", program.display()))?;
        Ok(wait(&mut child)?)
    }
}

#[derive(FromArgs)]
/// Change the working directory of the shell and of the programs it starts.
pub struct Cd {
    #[argh(positional)]
    /// new working directory, resolved against the current one; $HOME when omitted
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target {
            Some(target) => target,
            None => env.get_var("HOME").context("cd failed: HOME is not set")?,
        };
        // reported like perror: "cd failed: No such file or directory (os error 2)"
        let dir = fs::canonicalize(env.current_dir.join(target)).context("cd failed")?;
        env::set_current_dir(&dir).context("cd failed")?;
        env.current_dir = dir;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "👋 Goodbye!")?;
        env.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env as stdenv;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn run(cmd: Box<dyn ExecutableCommand>, env: &mut Environment) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = cmd.execute(&mut out, env).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn run_line<T: BuiltinCommand + 'static>(args: &[&str], env: &mut Environment) -> (ExitCode, String) {
        run(Factory::<T>::default().create(args), env)
    }

    #[test]
    fn test_greet_and_help() {
        let mut env = Environment::new();
        let (code, out) = run_line::<Greet>(&[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "👋 Hello! Welcome to your custom OOP-based shell!\n");

        let (code, out) = run_line::<Help>(&[], &mut env);
        assert_eq!(code, 0);
        assert!(out.starts_with("Available commands:\n"));
        assert!(out.contains("runcpp <file.cpp>"));
    }

    #[test]
    fn test_calc_adds() {
        let mut env = Environment::new();
        assert_eq!(run_line::<Calc>(&["2", "3"], &mut env), (0, "Result: 5\n".to_owned()));
        assert_eq!(run_line::<Calc>(&["-7", "3"], &mut env), (0, "Result: -4\n".to_owned()));
        assert_eq!(run_line::<Calc>(&["4", "-10"], &mut env), (0, "Result: -6\n".to_owned()));
    }

    #[test]
    fn test_calc_rejects_non_numbers() {
        let mut env = Environment::new();
        assert_eq!(
            run_line::<Calc>(&["two", "3"], &mut env),
            (1, "Invalid numbers\n".to_owned())
        );
        let max = i64::MAX.to_string();
        let (code, _) = run_line::<Calc>(&[max.as_str(), "1"], &mut env);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_calc_wrong_arity_prints_usage() {
        let mut env = Environment::new();
        let (code, out) = run_line::<Calc>(&["1"], &mut env);
        assert_eq!(code, 1);
        assert!(out.contains("rhs"), "unexpected usage output: {out}");
    }

    #[test]
    fn test_builtin_help_flag() {
        let mut env = Environment::new();
        let (code, out) = run_line::<Calc>(&["--help"], &mut env);
        assert_eq!(code, 0);
        assert!(out.contains("Usage: calc"));
    }

    #[test]
    fn test_repeat_joins_words() {
        let mut env = Environment::new();
        assert_eq!(
            run_line::<Repeat>(&["hello", "there", "world"], &mut env),
            (0, "hello there world\n".to_owned())
        );
        assert_eq!(run_line::<Repeat>(&[], &mut env), (0, "\n".to_owned()));
    }

    #[test]
    fn test_repeat_echoes_flags_and_help() {
        let mut env = Environment::new();
        assert_eq!(run_line::<Repeat>(&["-n", "hi"], &mut env), (0, "-n hi\n".to_owned()));
        assert_eq!(run_line::<Repeat>(&["help"], &mut env), (0, "help\n".to_owned()));
        assert_eq!(run_line::<Repeat>(&["--help"], &mut env), (0, "--help\n".to_owned()));
    }

    #[test]
    fn test_history_lists_previous_lines() {
        let mut env = Environment::new();
        env.history.push("greet");
        env.history.push("calc 1 2");
        env.history.push("history");

        let (code, out) = run_line::<History>(&[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "1: greet\n2: calc 1 2\n");
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = Environment::new();
        let (code, out) = run_line::<Exit>(&[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "👋 Goodbye!\n");
        assert!(env.should_exit);
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let target = canonical_temp.to_string_lossy().to_string();
        let (code, _) = run_line::<Cd>(&[target.as_str()], &mut env);
        let new_cwd = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(code, 0);
        assert_eq!(fs::canonicalize(new_cwd).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_relative_to_session_dir() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(canonical_temp.join("sub")).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        env.current_dir = canonical_temp.clone();
        let (code, _) = run_line::<Cd>(&["sub"], &mut env);
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(code, 0);
        assert_eq!(env.current_dir, canonical_temp.join("sub"));
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());
        let (code, _) = run_line::<Cd>(&[], &mut env);
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(code, 0);
        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let name = format!("nonexistent_dir_for_cd_test_{}", std::process::id());
        let (code, out) = run_line::<Cd>(&[name.as_str()], &mut env);

        assert_eq!(code, 1);
        assert!(
            out.starts_with("cd failed: No such file or directory"),
            "unexpected message: {out}"
        );
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }

    #[cfg(unix)]
    fn fake_compiler(dir: &Path) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fakecc");
        fs::write(
            &path,
            "#!/bin/sh\n\
             if grep -q broken \"$1\"; then echo \"$1:1: error: broken\" >&2; exit 1; fi\n\
             cp \"$1\" \"$3\" && chmod +x \"$3\"\n",
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    #[cfg(unix)]
    fn test_runcpp_compiles_and_runs() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = temp.path().to_owned();
        env.config.compiler = fake_compiler(temp.path());
        fs::write(temp.path().join("hello.cpp"), "#!/bin/sh\necho ran > ran.txt\n").unwrap();

        let (code, out) = run_line::<RunCpp>(&["hello.cpp"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "✅ Running hello.out...\n");
        assert!(temp.path().join("hello.out").exists());
        assert_eq!(fs::read_to_string(temp.path().join("ran.txt")).unwrap(), "ran\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_runcpp_reports_diagnostics() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = temp.path().to_owned();
        env.config.compiler = fake_compiler(temp.path());
        fs::write(temp.path().join("bad.cpp"), "broken\n").unwrap();

        let (code, out) = run_line::<RunCpp>(&["bad.cpp"], &mut env);
        assert_eq!(code, 1);
        assert_eq!(out, "❌ Compilation failed:\nbad.cpp:1: error: broken\n");
        assert!(!temp.path().join("bad.out").exists());
        assert!(temp.path().join("compile_errors.txt").exists());
    }

    #[test]
    fn test_runcpp_missing_compiler() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = temp.path().to_owned();
        env.config.compiler = "no-such-compiler-123".to_owned();

        let (code, out) = run_line::<RunCpp>(&["x.cpp"], &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("runcpp: can't run no-such-compiler-123"));
    }
}
