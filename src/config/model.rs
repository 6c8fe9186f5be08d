// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::allocdir::AllocDir;
use crate::exec::ExecutorOptions;
use crate::resources::Resources;
use crate::types::IsolationMode;

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [executor]
/// isolation = "auto"
/// kill_timeout = "5s"
///
/// [alloc]
/// dir = "/var/alloc/abc"
/// [alloc.task_dirs]
/// web = "/var/alloc/abc/web"
///
/// [task]
/// name = "web"
/// path = "$NOMAD_TASK_DIR/run.sh"
/// args = ["--port", "${PORT}"]
/// env = ["PORT=8080"]
///
/// [resources]
/// cpu = 500
/// memory_mb = 256
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub executor: ExecutorSection,

    pub alloc: AllocSection,

    pub task: TaskSection,

    /// Left optional so that a missing section surfaces as `NoResources`
    /// from the executor rather than as a parse error.
    #[serde(default)]
    pub resources: Option<Resources>,
}

/// `[executor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    #[serde(default)]
    pub isolation: IsolationMode,

    /// Duration string such as `"5s"`.
    #[serde(default = "default_kill_timeout")]
    pub kill_timeout: String,

    #[serde(default = "default_reattach_poll_interval")]
    pub reattach_poll_interval: String,
}

fn default_kill_timeout() -> String {
    "5s".to_string()
}

fn default_reattach_poll_interval() -> String {
    "100ms".to_string()
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::default(),
            kill_timeout: default_kill_timeout(),
            reattach_poll_interval: default_reattach_poll_interval(),
        }
    }
}

/// `[alloc]` section: the directory binding handed over by the allocation
/// directory manager.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocSection {
    pub dir: PathBuf,

    #[serde(default)]
    pub task_dirs: BTreeMap<String, PathBuf>,
}

/// `[task]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSection {
    pub name: String,

    /// Executable path; may contain `$NOMAD_TASK_DIR`.
    pub path: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// `KEY=VALUE` entries.
    #[serde(default)]
    pub env: Vec<String>,

    /// Optional wall-clock limit, e.g. `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub isolation: IsolationMode,
    pub kill_timeout: Duration,
    pub reattach_poll_interval: Duration,
}

impl ExecutorSettings {
    pub fn to_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            isolation: self.isolation,
            kill_timeout: self.kill_timeout,
            reattach_poll_interval: self.reattach_poll_interval,
            ..ExecutorOptions::default()
        }
    }
}

/// Validated task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    pub path: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub timeout: Option<Duration>,
}

/// Validated task file.
///
/// Only constructible through `TryFrom<RawConfigFile>`, which guarantees the
/// task has a directory binding and every duration parses.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub executor: ExecutorSettings,
    pub alloc: AllocDir,
    pub task: TaskSpec,
    pub resources: Option<Resources>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        executor: ExecutorSettings,
        alloc: AllocDir,
        task: TaskSpec,
        resources: Option<Resources>,
    ) -> Self {
        Self {
            executor,
            alloc,
            task,
            resources,
        }
    }
}
