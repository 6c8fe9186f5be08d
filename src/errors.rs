// src/errors.rs

//! Crate-wide error taxonomy and `Result` alias.
//!
//! The executor core never retries and never logs its own failures: every
//! variant below is returned to the immediate caller, which decides what to
//! do about it.

use thiserror::Error;

use crate::interp::InterpolationError;

#[derive(Error, Debug)]
pub enum ExecError {
    /// `limit` was called without a resource specification.
    #[error("no resources specified")]
    NoResources,

    /// The task name has no entry in the allocation's task directories.
    #[error("Error finding task dir for ({0})")]
    TaskDirNotFound(String),

    /// `start` was called before `configure_task_dir`.
    #[error("task directory has not been configured")]
    NotConfigured,

    /// Malformed placeholder syntax in the path, arguments or environment.
    #[error("error parsing command: {0}")]
    Interpolation(#[from] InterpolationError),

    /// The OS refused to spawn the process. The io error is passed through
    /// untouched.
    #[error("failed to launch {path:?}: {source}")]
    Launch {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pid {pid:?}: {source}")]
    InvalidPid {
        pid: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Failed to reopen pid {0}: no such process")]
    ProcessNotFound(i32),

    /// No live process handle: never started, or already reaped.
    #[error("Process has finished or was never started")]
    NoProcess,

    /// A termination request targeted a process that has already exited.
    #[error("no such process")]
    NoSuchProcess,

    #[error("failed to kill process: {0}")]
    Kill(#[source] std::io::Error),

    #[error("process exited with status {code}")]
    ExitFailure { code: i32 },

    #[error("process terminated by signal {signal}")]
    Signaled { signal: i32 },

    /// A reattached process went away after this executor killed it. The
    /// real exit status is not observable for processes we did not spawn.
    #[error("process was killed")]
    Killed,

    /// The command specification is frozen once the process has started.
    #[error("command cannot be modified after the process has started")]
    CommandLocked,

    /// The process was already started or opened by this executor.
    #[error("executor already owns a process")]
    AlreadyStarted,

    #[error("unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("invalid resources: {0}")]
    InvalidResources(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    /// Whether this is the "already dead" flavour of termination failure.
    pub fn is_no_such_process(&self) -> bool {
        matches!(self, ExecError::NoSuchProcess)
    }

    /// Exit code a CLI wrapper should report for a failed `wait`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::ExitFailure { code } => *code,
            ExecError::Signaled { signal } => 128 + signal,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_shell_conventions() {
        assert_eq!(ExecError::ExitFailure { code: 3 }.exit_code(), 3);
        assert_eq!(ExecError::Signaled { signal: 9 }.exit_code(), 137);
        assert_eq!(ExecError::NoProcess.exit_code(), 1);
    }

    #[test]
    fn task_dir_error_names_the_task() {
        let err = ExecError::TaskDirNotFound("web".to_string());
        assert!(err.to_string().contains("(web)"));
    }
}
