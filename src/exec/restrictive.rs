// src/exec/restrictive.rs

//! Executor that confines the task with the per-process limits a unix host
//! offers without cgroups: its own session and process group, an address
//! space ceiling, a file size ceiling and a scheduling priority derived from
//! the CPU shares.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::allocdir::AllocDir;
use crate::errors::{ExecError, Result};
use crate::interp::Interpolator;
use crate::resources::Resources;
use crate::types::Variant;

use super::backend::{BoxFuture, Executor};
use super::command::CommandSpec;
use super::shared::ExecutorCore;
use super::launch;
use super::process::{Origin, ProcessHandle};
use super::sys::StopSignal;

#[cfg(all(target_os = "linux", target_env = "gnu"))]
type RlimitResource = libc::__rlimit_resource_t;

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
type RlimitResource = libc::c_int;

/// CPU shares at or above this get the default priority.
const FULL_PRIORITY_CPU_MHZ: u32 = 1000;

/// Limits applied in the child between `fork` and `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub memory_bytes: Option<u64>,
    pub file_size_bytes: Option<u64>,
    pub nice: i32,
}

impl ProcessLimits {
    pub fn from_resources(resources: &Resources) -> Result<Self> {
        if resources.memory_mb == 0 {
            return Err(ExecError::InvalidResources(
                "memory_mb must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            memory_bytes: Some(resources.memory_bytes()),
            file_size_bytes: (resources.disk_mb > 0).then(|| resources.disk_bytes()),
            nice: nice_for_cpu(resources.cpu),
        })
    }

    /// Only async-signal-safe calls: this runs in the forked child.
    fn apply(&self) -> io::Result<()> {
        if let Some(bytes) = self.memory_bytes {
            cap_rlimit(libc::RLIMIT_AS, bytes)?;
        }
        if let Some(bytes) = self.file_size_bytes {
            cap_rlimit(libc::RLIMIT_FSIZE, bytes)?;
        }
        if self.nice != 0 && unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, self.nice) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Map CPU shares (MHz) to a nice value: 0 shares means "unspecified",
/// otherwise every missing 100 MHz below a full core costs one nice level.
fn nice_for_cpu(cpu: u32) -> i32 {
    if cpu == 0 || cpu >= FULL_PRIORITY_CPU_MHZ {
        return 0;
    }
    ((FULL_PRIORITY_CPU_MHZ - cpu) / 100).clamp(1, 10) as i32
}

/// Lower both soft and hard limits to `bytes`, never raising them.
fn cap_rlimit(resource: RlimitResource, bytes: u64) -> io::Result<()> {
    let mut current = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    if unsafe { libc::getrlimit(resource, &mut current) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let wanted = (bytes as libc::rlim_t).min(current.rlim_max);
    let rlim = libc::rlimit {
        rlim_cur: wanted,
        rlim_max: wanted,
    };
    if unsafe { libc::setrlimit(resource, &rlim) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Whether this host can run [`RestrictiveExecutor`].
pub fn restrictive_supported() -> bool {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    unsafe { libc::getrlimit(libc::RLIMIT_AS, &mut rlim) == 0 }
}

#[derive(Debug)]
pub struct RestrictiveExecutor {
    core: ExecutorCore,
    limits: Option<ProcessLimits>,
    kill_timeout: Duration,
}

impl RestrictiveExecutor {
    pub fn new(
        interpolator: Arc<dyn Interpolator>,
        kill_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            core: ExecutorCore::new(interpolator, poll_interval),
            limits: None,
            kill_timeout,
        }
    }

    pub fn limits(&self) -> Option<ProcessLimits> {
        self.limits
    }
}

impl Executor for RestrictiveExecutor {
    fn limit(&mut self, resources: Option<&Resources>) -> Result<()> {
        let resources = resources.ok_or(ExecError::NoResources)?;
        let limits = ProcessLimits::from_resources(resources)?;
        if self.core.has_process() {
            warn!(
                ?limits,
                "limits changed after launch; they only apply to the next launch"
            );
        }
        debug!(?limits, "resource limits recorded");
        self.limits = Some(limits);
        Ok(())
    }

    fn configure_task_dir(&mut self, task: &str, alloc: &AllocDir) -> Result<()> {
        self.core.configure_task_dir(task, alloc)
    }

    fn start(&mut self) -> Result<()> {
        let prepared = self.core.prepare()?;
        let rt = launch::runtime_handle()?;

        let mut command = prepared.to_command();
        let limits = self.limits;
        let hook = move || -> io::Result<()> {
            if unsafe { libc::setsid() } == -1 {
                return Err(io::Error::last_os_error());
            }
            if let Some(limits) = limits {
                limits.apply()?;
            }
            Ok(())
        };
        // SAFETY: the hook only issues async-signal-safe syscalls and does
        // not allocate.
        unsafe {
            command.pre_exec(hook);
        }

        let child = launch::spawn(command, &prepared.path)?;
        let handle = ProcessHandle::spawned(&rt, child, true)?;

        info!(
            pid = handle.pid(),
            path = %prepared.path,
            limits = ?self.limits,
            "process started in its own session"
        );
        self.core.adopt(handle, prepared);
        Ok(())
    }

    /// A pid that leads its own process group is signalled as a group, like
    /// a process this variant launched.
    fn open(&mut self, pid: &str) -> Result<()> {
        self.core.open(pid, true)
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.core.wait())
    }

    fn id(&self) -> Result<String> {
        self.core.id()
    }

    /// SIGTERM first; SIGKILL if the process is still around after the kill
    /// timeout.
    fn shutdown(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let handle = self.core.live_handle()?;
            handle.signal(StopSignal::Terminate).await?;

            if tokio::time::timeout(self.kill_timeout, handle.wait())
                .await
                .is_ok()
            {
                debug!(pid = handle.pid(), "process exited after SIGTERM");
                return Ok(());
            }

            warn!(
                pid = handle.pid(),
                timeout = ?self.kill_timeout,
                reattached = handle.origin() == Origin::Reattached,
                "process ignored SIGTERM; killing"
            );
            match self.core.force_stop().await {
                // Exited between the timeout and the kill.
                Err(ExecError::NoSuchProcess) => Ok(()),
                other => other,
            }
        })
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
        Variant::Restrictive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_follow_resources() {
        let limits = ProcessLimits::from_resources(&Resources {
            cpu: 500,
            memory_mb: 256,
            disk_mb: 0,
            iops: 0,
        })
        .unwrap();

        assert_eq!(limits.memory_bytes, Some(256 * 1024 * 1024));
        assert_eq!(limits.file_size_bytes, None);
        assert_eq!(limits.nice, 5);
    }

    #[test]
    fn zero_memory_is_rejected() {
        assert!(matches!(
            ProcessLimits::from_resources(&Resources::default()),
            Err(ExecError::InvalidResources(_))
        ));
    }

    #[test]
    fn cpu_shares_map_to_nice_levels() {
        assert_eq!(nice_for_cpu(0), 0);
        assert_eq!(nice_for_cpu(2000), 0);
        assert_eq!(nice_for_cpu(1000), 0);
        assert_eq!(nice_for_cpu(950), 1);
        assert_eq!(nice_for_cpu(100), 9);
        assert_eq!(nice_for_cpu(1), 9);
    }

    #[test]
    fn host_supports_rlimits() {
        assert!(restrictive_supported());
    }
}
