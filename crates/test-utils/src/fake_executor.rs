use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use taskexec::allocdir::AllocDir;
use taskexec::errors::{ExecError, Result};
use taskexec::exec::{BoxFuture, CommandSpec, Executor};
use taskexec::resources::Resources;
use taskexec::types::Variant;

const KILLED: i32 = -9;

/// Lets a test decide when and how the fake "process" exits.
#[derive(Clone)]
pub struct FakeProcess {
    exit_tx: Arc<watch::Sender<Option<i32>>>,
}

impl FakeProcess {
    /// Make the process exit with `code`.
    pub fn exit(&self, code: i32) {
        let _ = self.exit_tx.send(Some(code));
    }
}

/// An executor that spawns nothing.
///
/// - records every lifecycle call in order
/// - `wait` blocks until [`FakeProcess::exit`] or a stop call
/// - `shutdown` can be told to be ignored, to exercise escalation paths
pub struct FakeExecutor {
    cmd: CommandSpec,
    dir: Option<PathBuf>,
    started: bool,
    ignore_shutdown: bool,
    calls: Arc<Mutex<Vec<String>>>,
    exit_tx: Arc<watch::Sender<Option<i32>>>,
    exit_rx: watch::Receiver<Option<i32>>,
}

impl FakeExecutor {
    pub fn new(calls: Arc<Mutex<Vec<String>>>) -> (Self, FakeProcess) {
        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_tx = Arc::new(exit_tx);
        let process = FakeProcess {
            exit_tx: Arc::clone(&exit_tx),
        };
        let exec = Self {
            cmd: CommandSpec::new("/fake"),
            dir: None,
            started: false,
            ignore_shutdown: false,
            calls,
            exit_tx,
            exit_rx,
        };
        (exec, process)
    }

    pub fn ignoring_shutdown(mut self) -> Self {
        self.ignore_shutdown = true;
        self
    }

    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    fn kill(&self) -> Result<()> {
        if !self.started {
            return Err(ExecError::NoProcess);
        }
        if self.exited() {
            return Err(ExecError::NoSuchProcess);
        }
        let _ = self.exit_tx.send(Some(KILLED));
        Ok(())
    }
}

impl Executor for FakeExecutor {
    fn limit(&mut self, resources: Option<&Resources>) -> Result<()> {
        self.record("limit");
        resources.map(|_| ()).ok_or(ExecError::NoResources)
    }

    fn configure_task_dir(&mut self, task: &str, alloc: &AllocDir) -> Result<()> {
        self.record("configure_task_dir");
        let dir = alloc
            .task_dir(task)
            .ok_or_else(|| ExecError::TaskDirNotFound(task.to_string()))?;
        self.dir = Some(dir.to_path_buf());
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.record("start");
        self.started = true;
        Ok(())
    }

    fn open(&mut self, _pid: &str) -> Result<()> {
        self.record("open");
        self.started = true;
        Ok(())
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        self.record("wait");
        let mut rx = self.exit_rx.clone();
        let started = self.started;
        Box::pin(async move {
            if !started {
                return Err(ExecError::NoProcess);
            }
            let code = match rx.wait_for(Option::is_some).await {
                Ok(code) => *code,
                Err(_) => None,
            };
            match code {
                Some(0) | None => Ok(()),
                Some(KILLED) => Err(ExecError::Signaled { signal: 9 }),
                Some(code) => Err(ExecError::ExitFailure { code }),
            }
        })
    }

    fn id(&self) -> Result<String> {
        if self.started && !self.exited() {
            Ok("4242".to_string())
        } else {
            Err(ExecError::NoProcess)
        }
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<()>> {
        self.record("shutdown");
        Box::pin(async move {
            if self.ignore_shutdown {
                return Ok(());
            }
            self.kill()
        })
    }

    fn force_stop(&self) -> BoxFuture<'_, Result<()>> {
        self.record("force_stop");
        Box::pin(async move { self.kill() })
    }

    fn command(&mut self) -> &mut CommandSpec {
        &mut self.cmd
    }

    fn command_spec(&self) -> &CommandSpec {
        &self.cmd
    }

    fn variant(&self) -> Variant {
        Variant::Portable
    }
}
