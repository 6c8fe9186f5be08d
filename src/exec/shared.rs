// src/exec/shared.rs

//! State and operations every executor variant shares.
//!
//! A variant owns an [`ExecutorCore`] and only decides how a process is
//! launched, limited and asked to stop. Everything that works on an already
//! running process lives here.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::allocdir::AllocDir;
use crate::errors::{ExecError, Result};
use crate::interp::Interpolator;

use super::command::CommandSpec;
use super::launch::{self, PreparedCommand};
use super::process::ProcessHandle;
use super::sys::{self, StopSignal};

#[derive(Debug)]
pub struct ExecutorCore {
    cmd: CommandSpec,
    handle: Option<ProcessHandle>,
    interpolator: Arc<dyn Interpolator>,
    poll_interval: Duration,
}

impl ExecutorCore {
    pub fn new(interpolator: Arc<dyn Interpolator>, poll_interval: Duration) -> Self {
        Self {
            cmd: CommandSpec::default(),
            handle: None,
            interpolator,
            poll_interval,
        }
    }

    pub fn command(&mut self) -> &mut CommandSpec {
        &mut self.cmd
    }

    pub fn command_spec(&self) -> &CommandSpec {
        &self.cmd
    }

    pub fn configure_task_dir(&mut self, task: &str, alloc: &AllocDir) -> Result<()> {
        let dir = alloc
            .task_dir(task)
            .ok_or_else(|| ExecError::TaskDirNotFound(task.to_string()))?;
        self.cmd.bind_dir(dir.to_path_buf())
    }

    pub fn has_process(&self) -> bool {
        self.handle.is_some()
    }

    /// Interpolate the command for a launch. Fails if a process is already
    /// owned.
    pub fn prepare(&self) -> Result<PreparedCommand> {
        if self.handle.is_some() {
            return Err(ExecError::AlreadyStarted);
        }
        launch::prepare(&self.cmd, self.interpolator.as_ref())
    }

    /// Take ownership of a freshly launched process and lock the command.
    pub fn adopt(&mut self, handle: ProcessHandle, prepared: PreparedCommand) {
        self.cmd.mark_started(prepared.path, prepared.args);
        self.handle = Some(handle);
    }

    /// Reattach to `pid`. With `group_if_leader`, signals target the pid's
    /// process group when the pid leads one.
    pub fn open(&mut self, pid: &str, group_if_leader: bool) -> Result<()> {
        if self.handle.is_some() {
            return Err(ExecError::AlreadyStarted);
        }
        let pid = launch::parse_pid(pid)?;
        if !sys::is_alive(pid) {
            return Err(ExecError::ProcessNotFound(pid));
        }
        let rt = launch::runtime_handle()?;
        let group = group_if_leader && sys::leads_process_group(pid);

        info!(pid, group, "reattached to process");
        self.handle = Some(ProcessHandle::reattached(&rt, pid, self.poll_interval, group));
        self.cmd.lock();
        Ok(())
    }

    pub fn live_handle(&self) -> Result<&ProcessHandle> {
        self.handle.as_ref().ok_or(ExecError::NoProcess)
    }

    pub async fn wait(&self) -> Result<()> {
        let handle = self.live_handle()?;
        let outcome = handle.wait().await;
        outcome.into_result(handle.stopped_by_us())
    }

    pub fn id(&self) -> Result<String> {
        match &self.handle {
            Some(handle) if !handle.has_exited() => Ok(handle.pid().to_string()),
            _ => Err(ExecError::NoProcess),
        }
    }

    pub async fn force_stop(&self) -> Result<()> {
        self.live_handle()?.signal(StopSignal::Kill).await
    }
}
