// src/exec/portable.rs

//! Executor that works everywhere and therefore isolates nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::allocdir::AllocDir;
use crate::errors::{ExecError, Result};
use crate::interp::Interpolator;
use crate::resources::Resources;
use crate::types::Variant;

use super::backend::{BoxFuture, Executor};
use super::command::CommandSpec;
use super::shared::ExecutorCore;
use super::launch;
use super::process::ProcessHandle;

/// Runs the command as a plain child process.
///
/// Resource specifications are checked for presence and otherwise ignored;
/// there is no graceful shutdown, so `shutdown` kills straight away.
#[derive(Debug)]
pub struct PortableExecutor {
    core: ExecutorCore,
}

impl PortableExecutor {
    pub fn new(interpolator: Arc<dyn Interpolator>, poll_interval: Duration) -> Self {
        Self {
            core: ExecutorCore::new(interpolator, poll_interval),
        }
    }
}

impl Executor for PortableExecutor {
    fn limit(&mut self, resources: Option<&Resources>) -> Result<()> {
        let resources = resources.ok_or(ExecError::NoResources)?;
        debug!(?resources, "portable executor does not enforce resource limits");
        Ok(())
    }

    fn configure_task_dir(&mut self, task: &str, alloc: &AllocDir) -> Result<()> {
        self.core.configure_task_dir(task, alloc)
    }

    fn start(&mut self) -> Result<()> {
        let prepared = self.core.prepare()?;
        let rt = launch::runtime_handle()?;

        let child = launch::spawn(prepared.to_command(), &prepared.path)?;
        let handle = ProcessHandle::spawned(&rt, child, false)?;

        info!(pid = handle.pid(), path = %prepared.path, "process started");
        self.core.adopt(handle, prepared);
        Ok(())
    }

    fn open(&mut self, pid: &str) -> Result<()> {
        self.core.open(pid, false)
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.core.wait())
    }

    fn id(&self) -> Result<String> {
        self.core.id()
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.core.force_stop())
    }

    fn force_stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.core.force_stop())
    }

    fn command(&mut self) -> &mut CommandSpec {
        self.core.command()
    }

    fn command_spec(&self) -> &CommandSpec {
        self.core.command_spec()
    }

    fn variant(&self) -> Variant {
        Variant::Portable
    }
}
