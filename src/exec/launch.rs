// src/exec/launch.rs

//! Start pipeline shared by every executor variant: interpolate the command,
//! build the OS command, and parse pids for reattachment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::debug;

use crate::errors::{ExecError, Result};
use crate::interp::{Interpolator, TASK_DIR_VAR, TaskEnv};

use super::command::CommandSpec;

/// A command with every placeholder resolved, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub path: String,
    pub args: Vec<String>,
    pub env: TaskEnv,
    pub dir: PathBuf,
}

impl PreparedCommand {
    /// Build the Tokio command. The task environment is layered over the
    /// agent's own environment.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(&self.args)
            .envs(self.env.iter())
            .current_dir(&self.dir)
            .stdin(Stdio::null());
        cmd
    }
}

/// Resolve the task-directory token in the path, then tokens in the
/// environment values, then tokens in the arguments against the resolved
/// environment.
///
/// Arguments are re-joined with shell quoting before interpolation so that an
/// argument containing spaces stays a single argument.
pub fn prepare(spec: &CommandSpec, interpolator: &dyn Interpolator) -> Result<PreparedCommand> {
    let dir = spec.dir().ok_or(ExecError::NotConfigured)?.to_path_buf();

    let mut task_dir_vars = HashMap::with_capacity(1);
    task_dir_vars.insert(
        TASK_DIR_VAR.to_string(),
        dir.to_string_lossy().into_owned(),
    );
    let path = interpolator
        .parse_and_replace(spec.path(), &task_dir_vars)?
        .join(" ");

    let env = TaskEnv::parse_from_list(spec.env())?
        .with_task_dir(&dir)
        .resolve_values(interpolator)?;

    let joined = shell_words::join(spec.args());
    let args = interpolator.parse_and_replace(&joined, env.map())?;

    debug!(path = %path, ?args, dir = %dir.display(), "command interpolated");

    Ok(PreparedCommand {
        path,
        args,
        env,
        dir,
    })
}

/// Parse the decimal pid handed to `open`.
pub fn parse_pid(pid: &str) -> Result<i32> {
    let parsed: i32 = pid.parse().map_err(|source| ExecError::InvalidPid {
        pid: pid.to_string(),
        source,
    })?;
    if parsed <= 0 {
        return Err(ExecError::ProcessNotFound(parsed));
    }
    Ok(parsed)
}

/// The runtime the supervisor tasks are spawned on.
pub fn runtime_handle() -> Result<Handle> {
    Handle::try_current().map_err(|e| {
        ExecError::Unsupported(format!("executor operations need a Tokio runtime: {e}"))
    })
}

/// Spawn `cmd`, mapping any OS failure to `Launch` with the io error intact.
pub fn spawn(mut cmd: Command, path: &str) -> Result<tokio::process::Child> {
    cmd.spawn().map_err(|source| ExecError::Launch {
        path: path.to_string(),
        source,
    })
}
