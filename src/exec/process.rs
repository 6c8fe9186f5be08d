// src/exec/process.rs

//! Live process handle and its supervisor task.
//!
//! A handle never touches the OS process directly. A background Tokio task
//! owns the process: for a child we spawned it owns the `Child` and reaps it,
//! for a reattached pid it polls for liveness. Kill requests travel to that
//! task over a channel and the exit outcome comes back over a `watch`
//! channel, so any number of `wait` calls can race a `force_stop` without
//! sharing mutable state.

use std::io;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::Child;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::errors::{ExecError, Result};

use super::sys::{self, StopSignal};

/// How a process ended, as far as we could observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
    /// Exit status not observable (reattached process, or reaping failed).
    Unknown,
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }
        ExitOutcome::Unknown
    }

    /// Map onto the `wait` contract. `stopped_by_us` turns an unknown outcome
    /// into `Killed` so a reattached caller can tell a kill from a clean exit.
    pub fn into_result(self, stopped_by_us: bool) -> Result<()> {
        match self {
            ExitOutcome::Exited(0) => Ok(()),
            ExitOutcome::Exited(code) => Err(ExecError::ExitFailure { code }),
            ExitOutcome::Signaled(signal) => Err(ExecError::Signaled { signal }),
            ExitOutcome::Unknown if stopped_by_us => Err(ExecError::Killed),
            ExitOutcome::Unknown => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Spawned,
    Reattached,
}

#[derive(Debug)]
struct KillRequest {
    signal: StopSignal,
    reply: oneshot::Sender<Result<()>>,
}

#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    origin: Origin,
    kill_tx: mpsc::Sender<KillRequest>,
    exit_rx: watch::Receiver<Option<ExitOutcome>>,
    stopped_by_us: AtomicBool,
}

impl ProcessHandle {
    /// Take ownership of a freshly spawned child.
    ///
    /// With `group` set, signals go to the process group led by the child
    /// (the child must have called `setsid`).
    pub(crate) fn spawned(rt: &Handle, child: Child, group: bool) -> Result<Self> {
        let pid = child.id().ok_or(ExecError::NoProcess)?;
        let (kill_tx, kill_rx) = mpsc::channel(4);
        let (exit_tx, exit_rx) = watch::channel(None);

        rt.spawn(supervise_child(child, pid as i32, group, kill_rx, exit_tx));

        Ok(Self {
            pid,
            origin: Origin::Spawned,
            kill_tx,
            exit_rx,
            stopped_by_us: AtomicBool::new(false),
        })
    }

    /// Track a process we did not spawn, polling every `poll` for its exit.
    ///
    /// With `group` set, signals go to the process group led by `pid`.
    pub(crate) fn reattached(rt: &Handle, pid: i32, poll: Duration, group: bool) -> Self {
        let (kill_tx, kill_rx) = mpsc::channel(4);
        let (exit_tx, exit_rx) = watch::channel(None);

        rt.spawn(watch_pid(pid, poll, group, kill_rx, exit_tx));

        Self {
            pid: pid as u32,
            origin: Origin::Reattached,
            kill_tx,
            exit_rx,
            stopped_by_us: AtomicBool::new(false),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    pub fn stopped_by_us(&self) -> bool {
        self.stopped_by_us.load(Ordering::SeqCst)
    }

    /// Resolve once the supervisor has seen the process exit.
    pub async fn wait(&self) -> ExitOutcome {
        let mut rx = self.exit_rx.clone();
        let seen = match rx.wait_for(Option::is_some).await {
            Ok(seen) => *seen,
            Err(_) => None,
        };
        seen.unwrap_or(ExitOutcome::Unknown)
    }

    /// Deliver `signal` through the supervisor.
    pub async fn signal(&self, signal: StopSignal) -> Result<()> {
        if self.has_exited() {
            return Err(ExecError::NoSuchProcess);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.kill_tx
            .send(KillRequest {
                signal,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ExecError::NoSuchProcess)?;

        match reply_rx.await {
            Ok(Ok(())) => {
                self.stopped_by_us.store(true, Ordering::SeqCst);
                debug!(pid = self.pid, ?signal, "signal delivered");
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            // Supervisor finished between the send and the reply.
            Err(_) => Err(ExecError::NoSuchProcess),
        }
    }
}

fn signal_error(err: io::Error) -> ExecError {
    if sys::is_no_such_process(&err) {
        ExecError::NoSuchProcess
    } else {
        ExecError::Kill(err)
    }
}

async fn supervise_child(
    mut child: Child,
    pid: i32,
    group: bool,
    mut kill_rx: mpsc::Receiver<KillRequest>,
    exit_tx: watch::Sender<Option<ExitOutcome>>,
) {
    // Either the process exits on its own, or we get asked to signal it. The
    // child is only reaped here, so its pid cannot be recycled while a kill
    // request is being served.
    let outcome = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ExitOutcome::from_status(status),
                    Err(err) => {
                        debug!(pid, error = %err, "waiting on child failed");
                        ExitOutcome::Unknown
                    }
                };
            }

            Some(req) = kill_rx.recv() => {
                // Exited but not reaped yet: the kill would land on a zombie
                // and report success.
                if let Ok(Some(status)) = child.try_wait() {
                    let _ = req.reply.send(Err(ExecError::NoSuchProcess));
                    break ExitOutcome::from_status(status);
                }
                let res = if group {
                    sys::send_signal(pid, req.signal, true)
                } else if req.signal == StopSignal::Kill {
                    child.start_kill()
                } else {
                    sys::send_signal(pid, req.signal, false)
                };
                let _ = req.reply.send(res.map_err(signal_error));
            }
        }
    };

    info!(pid, ?outcome, "process exited");
    let _ = exit_tx.send(Some(outcome));
}

async fn watch_pid(
    pid: i32,
    poll: Duration,
    group: bool,
    mut kill_rx: mpsc::Receiver<KillRequest>,
    exit_tx: watch::Sender<Option<ExitOutcome>>,
) {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !sys::is_alive(pid) {
                    break;
                }
            }

            Some(req) = kill_rx.recv() => {
                let res = sys::send_signal(pid, req.signal, group);
                let _ = req.reply.send(res.map_err(signal_error));
            }

            // Every handle is gone; nobody can observe the exit any more.
            _ = exit_tx.closed() => {
                debug!(pid, "reattached handle dropped; stop polling");
                return;
            }
        }
    }

    info!(pid, "reattached process exited");
    let _ = exit_tx.send(Some(ExitOutcome::Unknown));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_after_unobserved_exit_reports_no_such_process() {
        let child = tokio::process::Command::new("true").spawn().unwrap();
        // Block the runtime so the supervisor cannot observe the exit first.
        std::thread::sleep(Duration::from_millis(200));

        let handle = ProcessHandle::spawned(&Handle::current(), child, false).unwrap();
        assert!(!handle.has_exited());

        assert!(matches!(
            handle.signal(StopSignal::Kill).await,
            Err(ExecError::NoSuchProcess)
        ));
        assert!(!handle.stopped_by_us());
        assert_eq!(handle.wait().await, ExitOutcome::Exited(0));
    }

    #[test]
    fn outcome_maps_onto_wait_contract() {
        assert!(ExitOutcome::Exited(0).into_result(false).is_ok());
        assert!(matches!(
            ExitOutcome::Exited(2).into_result(false),
            Err(ExecError::ExitFailure { code: 2 })
        ));
        assert!(matches!(
            ExitOutcome::Signaled(9).into_result(true),
            Err(ExecError::Signaled { signal: 9 })
        ));
        assert!(ExitOutcome::Unknown.into_result(false).is_ok());
        assert!(matches!(
            ExitOutcome::Unknown.into_result(true),
            Err(ExecError::Killed)
        ));
    }
}
