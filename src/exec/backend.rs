// src/exec/backend.rs

//! The executor capability contract.
//!
//! An `Executor` owns one task's command specification and, once started or
//! reopened, the handle of the OS process running it. Callers only ever see
//! `dyn Executor`; which implementation backs it is decided once by
//! [`new_executor`](super::new_executor).
//!
//! Mutating operations take `&mut self` and are expected to be driven by a
//! single owner. After `start`/`open` the owner may move the executor into an
//! `Arc` and call `wait` from one task while another calls `force_stop` or
//! `shutdown`; a blocked `wait` returns as soon as the kill takes effect.

use std::future::Future;
use std::pin::Pin;

use crate::allocdir::AllocDir;
use crate::errors::Result;
use crate::resources::Resources;
use crate::types::Variant;

use super::command::CommandSpec;

/// Boxed future returned by the asynchronous executor operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait Executor: Send + Sync {
    /// Validate and, where supported, apply resource limits.
    ///
    /// `None` always fails with `NoResources`. The portable variant accepts
    /// any specification without enforcing it.
    fn limit(&mut self, resources: Option<&Resources>) -> Result<()>;

    /// Bind the command's working directory to `task`'s directory in
    /// `alloc`. Must be called before `start`.
    fn configure_task_dir(&mut self, task: &str, alloc: &AllocDir) -> Result<()>;

    /// Interpolate the command and launch it.
    ///
    /// Requires a Tokio runtime. On failure no process is left behind and
    /// `id` keeps failing with `NoProcess`.
    fn start(&mut self) -> Result<()>;

    /// Reattach to an already running process by its decimal pid.
    ///
    /// A successful `open` does not prove the process is still the one we
    /// launched: pids can be reused, and nothing here checks process
    /// identity. Use `wait` or a signal to confirm liveness.
    fn open(&mut self, pid: &str) -> Result<()>;

    /// Resolve when the process exits.
    ///
    /// `Ok(())` for a clean exit, an error describing the exit code or signal
    /// otherwise. Fails immediately with `NoProcess` if nothing was started.
    fn wait(&self) -> BoxFuture<'_, Result<()>>;

    /// Decimal pid of the live process.
    fn id(&self) -> Result<String>;

    /// Ask the process to stop, escalating to `force_stop` where the variant
    /// has a graceful path.
    fn shutdown(&self) -> BoxFuture<'_, Result<()>>;

    /// Kill the process unconditionally. Reports `NoSuchProcess` if it has
    /// already exited.
    fn force_stop(&self) -> BoxFuture<'_, Result<()>>;

    /// Mutable access to the command specification. Setters reject changes
    /// once the process has started.
    fn command(&mut self) -> &mut CommandSpec;

    fn command_spec(&self) -> &CommandSpec;

    fn variant(&self) -> Variant;
}
