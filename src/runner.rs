// src/runner.rs

//! Caller-side supervision of a started executor.
//!
//! The executor itself has no timeouts and no cooperative cancellation. This
//! module layers both on top of the contract: `wait` is raced against a timer
//! and an external shutdown signal, and whichever fires first decides whether
//! the process gets `force_stop` or `shutdown`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::{ExecError, Result};
use crate::exec::Executor;

/// Why supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The process exited on its own.
    Exited,
    /// The timeout elapsed and the process was force-stopped.
    TimedOut,
    /// The shutdown future resolved and the process was asked to stop.
    ShutdownRequested,
}

#[derive(Debug)]
pub struct TaskExit {
    pub reason: StopReason,
    /// What `wait` returned, or the termination error if stopping failed.
    pub result: Result<()>,
}

impl TaskExit {
    pub fn success(&self) -> bool {
        self.reason == StopReason::Exited && self.result.is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuperviseOptions {
    pub timeout: Option<Duration>,
}

/// Wait for `executor`'s process, stopping it on timeout or shutdown.
pub async fn supervise<F>(
    executor: Arc<dyn Executor>,
    options: SuperviseOptions,
    shutdown: F,
) -> TaskExit
where
    F: Future<Output = ()>,
{
    let mut wait = executor.wait();

    let deadline = async {
        match options.timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    let reason = tokio::select! {
        result = &mut wait => {
            return TaskExit { reason: StopReason::Exited, result };
        }
        _ = deadline => StopReason::TimedOut,
        _ = shutdown => StopReason::ShutdownRequested,
    };

    let pid = executor.id().ok();
    let stopped = match reason {
        StopReason::TimedOut => {
            info!(?pid, timeout = ?options.timeout, "task timed out; force stopping");
            executor.force_stop().await
        }
        _ => {
            info!(?pid, "shutdown requested; stopping task");
            executor.shutdown().await
        }
    };

    match stopped {
        // Already gone: `wait` below reports how it ended.
        Ok(()) | Err(ExecError::NoSuchProcess) => {}
        Err(err) => {
            warn!(?pid, error = %err, "failed to stop task");
            return TaskExit {
                reason,
                result: Err(err),
            };
        }
    }

    let result = wait.await;
    TaskExit { reason, result }
}
