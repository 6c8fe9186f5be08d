// src/exec/factory.rs

//! Variant selection.
//!
//! The choice between restrictive and portable execution is made once, at
//! construction, so callers only ever handle `Box<dyn Executor>`.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::{ExecError, Result};
use crate::interp::{Interpolator, ShellInterpolator};
use crate::types::{IsolationMode, Variant};

use super::backend::Executor;
use super::portable::PortableExecutor;

pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REATTACH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the factory needs to build an executor.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub isolation: IsolationMode,

    /// Grace period between SIGTERM and SIGKILL on graceful shutdown.
    pub kill_timeout: Duration,

    /// How often a reattached process is probed for liveness.
    pub reattach_poll_interval: Duration,

    pub interpolator: Arc<dyn Interpolator>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::default(),
            kill_timeout: DEFAULT_KILL_TIMEOUT,
            reattach_poll_interval: DEFAULT_REATTACH_POLL_INTERVAL,
            interpolator: Arc::new(ShellInterpolator),
        }
    }
}

impl ExecutorOptions {
    pub fn with_isolation(mut self, isolation: IsolationMode) -> Self {
        self.isolation = isolation;
        self
    }
}

/// Whether the restrictive variant can run on this host.
#[cfg(unix)]
pub fn restrictive_supported() -> bool {
    super::restrictive::restrictive_supported()
}

#[cfg(not(unix))]
pub fn restrictive_supported() -> bool {
    false
}

/// Which variant `new_executor` would build for `isolation` on this host.
pub fn select_variant(isolation: IsolationMode) -> Result<Variant> {
    match isolation {
        IsolationMode::Portable => Ok(Variant::Portable),
        IsolationMode::Auto if restrictive_supported() => Ok(Variant::Restrictive),
        IsolationMode::Auto => Ok(Variant::Portable),
        IsolationMode::Restrictive if restrictive_supported() => Ok(Variant::Restrictive),
        IsolationMode::Restrictive => Err(ExecError::Unsupported(
            "restrictive execution is not available on this host".to_string(),
        )),
    }
}

/// Build a new executor, preferring the restrictive variant where allowed.
pub fn new_executor(options: &ExecutorOptions) -> Result<Box<dyn Executor>> {
    let variant = select_variant(options.isolation)?;
    let poll = options.reattach_poll_interval.max(Duration::from_millis(1));
    debug!(%variant, isolation = ?options.isolation, "building executor");

    match variant {
        Variant::Portable => Ok(Box::new(PortableExecutor::new(
            Arc::clone(&options.interpolator),
            poll,
        ))),
        #[cfg(unix)]
        Variant::Restrictive => Ok(Box::new(super::restrictive::RestrictiveExecutor::new(
            Arc::clone(&options.interpolator),
            options.kill_timeout,
            poll,
        ))),
        #[cfg(not(unix))]
        Variant::Restrictive => Err(ExecError::Unsupported(
            "restrictive execution is not available on this host".to_string(),
        )),
    }
}
