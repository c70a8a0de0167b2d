//! Launching external programs.

use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::LaunchError;
use crate::parser::ExecutionRequest;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// What [`launch`] did with the new process.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// The program ran in the foreground and has terminated.
    Exited(ExitCode),
    /// The program is still running; the caller owns the handle now.
    Background(Child),
}

/// Start the program described by `request`.
///
/// Redirection files are opened (input for reading, output created or
/// truncated) and the program is located before anything is spawned, so a bad
/// path or an unknown program never produces a process. The child inherits
/// the session's variables and working directory.
///
/// Foreground requests block until the child terminates. Background requests
/// return the [`Child`] right away.
pub fn launch(
    request: &ExecutionRequest,
    env: &Environment,
) -> Result<LaunchOutcome, LaunchError> {
    let (program, args) = request
        .argv
        .split_first()
        .ok_or(LaunchError::EmptyCommand)?;

    let stdin = match &request.input {
        Some(path) => redirect(path, env, |p| File::open(p))?,
        None => Stdio::inherit(),
    };
    let stdout = match &request.output {
        Some(path) => redirect(path, env, |p| File::create(p))?,
        None => Stdio::inherit(),
    };

    let mut command = prepare(program, args, env)?;
    command.stdin(stdin).stdout(stdout);
    let mut child = command
        .spawn()
        .map_err(|e| LaunchError::from_spawn(program, e))?;
    // the command still holds our copies of the redirection files
    drop(command);
    debug!(pid = child.id(), %program, background = request.background, "spawned");

    if request.background {
        return Ok(LaunchOutcome::Background(child));
    }
    wait(&mut child).map(LaunchOutcome::Exited)
}

/// Build a [`Command`] for `program` with the session's environment.
///
/// Fails with [`LaunchError::Exec`] when the program cannot be found.
pub(crate) fn prepare(
    program: &str,
    args: &[String],
    env: &Environment,
) -> Result<Command, LaunchError> {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let executable = find_command_path(
        OsStr::new(&search_paths),
        Path::new(program),
        &env.current_dir,
    )
    .ok_or_else(|| LaunchError::not_found(program))?;

    let mut command = Command::new(executable);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(program);
    }
    command
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    Ok(command)
}

/// Block until `child` terminates and translate its status.
pub(crate) fn wait(child: &mut Child) -> Result<ExitCode, LaunchError> {
    let status = child.wait().map_err(LaunchError::Wait)?;
    let code = exit_code(status);
    debug!(pid = child.id(), code, "reaped");
    Ok(code)
}

fn redirect(
    path: &Path,
    env: &Environment,
    open: impl FnOnce(&Path) -> std::io::Result<File>,
) -> Result<Stdio, LaunchError> {
    let file = open(&env.current_dir.join(path)).map_err(|source| LaunchError::Redirect {
        path: path.to_owned(),
        source,
    })?;
    Ok(Stdio::from(file))
}

pub(crate) fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: returned if it is an executable file.
/// - Path with a separator (`bin/tool`, `./tool`): resolved against `cwd`.
/// - Single component: the first match in `search_paths` (PATH). On non-Unix
///   platforms `cwd` is tried first.
/// - Empty path: `None`.
pub fn find_command_path(search_paths: &OsStr, path: &Path, cwd: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) if !path.starts_with(".") => {
            if cfg!(not(unix)) {
                if let Some(found) = find_by_path(&cwd.join(path)) {
                    return Some(found);
                }
            }
            find_in_path(search_paths, x.as_os_str())
        }
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        Some(path.to_owned())
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
