// src/lib.rs

pub mod allocdir;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod interp;
pub mod logging;
pub mod resources;
pub mod runner;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::{ConfigFile, parse_duration};
use crate::exec::{Executor, ExecutorOptions, new_executor};
use crate::runner::{StopReason, SuperviseOptions, TaskExit, supervise};
use crate::types::IsolationMode;

/// High-level entry point used by `main.rs`.
///
/// Returns the exit code the binary should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Run {
            config,
            isolation,
            dry_run,
            print_pid,
        } => run_task(config, isolation, dry_run, print_pid).await,
        Command::Reattach {
            pid,
            kill,
            poll,
            isolation,
        } => reattach(&pid, kill, &poll, isolation).await,
    }
}

/// Build an executor for the task file, start it and supervise it until it
/// exits, times out, or Ctrl-C asks it to stop.
async fn run_task(
    config_path: PathBuf,
    isolation: Option<IsolationMode>,
    dry_run: bool,
    print_pid: bool,
) -> Result<i32> {
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading task file {:?}", config_path))?;

    let mut options = cfg.executor.to_options();
    if let Some(isolation) = isolation {
        options.isolation = isolation;
    }

    let mut executor = prepare_executor(&cfg, &options)?;

    if dry_run {
        print_dry_run(&cfg, executor.as_ref(), &options)?;
        return Ok(0);
    }

    executor
        .start()
        .with_context(|| format!("starting task '{}'", cfg.task.name))?;
    let pid = executor.id()?;
    if print_pid {
        println!("{pid}");
    }
    info!(
        task = %cfg.task.name,
        pid = %pid,
        variant = %executor.variant(),
        "task running"
    );

    let executor: Arc<dyn Executor> = Arc::from(executor);
    let exit = supervise(
        executor,
        SuperviseOptions {
            timeout: cfg.task.timeout,
        },
        ctrl_c(),
    )
    .await;

    Ok(report(&cfg.task.name, exit))
}

/// Configure a fresh executor from the task file. Nothing is launched.
fn prepare_executor(cfg: &ConfigFile, options: &ExecutorOptions) -> Result<Box<dyn Executor>> {
    let mut executor = new_executor(options)?;

    let cmd = executor.command();
    cmd.set_path(cfg.task.path.clone())?;
    cmd.set_args(cfg.task.args.iter().cloned())?;
    cmd.set_env(cfg.task.env.iter().cloned())?;

    executor.configure_task_dir(&cfg.task.name, &cfg.alloc)?;
    executor.limit(cfg.resources.as_ref()).with_context(|| {
        if cfg.resources.is_none() {
            "task file needs a [resources] section".to_string()
        } else {
            format!("applying resources to task '{}'", cfg.task.name)
        }
    })?;

    Ok(executor)
}

async fn reattach(pid: &str, kill: bool, poll: &str, isolation: IsolationMode) -> Result<i32> {
    let poll = parse_duration(poll).map_err(|e| anyhow::anyhow!("--poll: {e}"))?;
    let options = ExecutorOptions {
        isolation,
        reattach_poll_interval: poll,
        ..ExecutorOptions::default()
    };

    let mut executor = new_executor(&options)?;
    executor
        .open(pid)
        .with_context(|| format!("reattaching to pid {pid}"))?;
    info!(pid, variant = %executor.variant(), "reattached");

    if kill {
        executor.force_stop().await?;
    }

    let executor: Arc<dyn Executor> = Arc::from(executor);
    let exit = supervise(executor, SuperviseOptions::default(), ctrl_c()).await;
    Ok(report(pid, exit))
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn report(task: &str, exit: TaskExit) -> i32 {
    match (&exit.reason, &exit.result) {
        (StopReason::Exited, Ok(())) => {
            info!(task, "task completed");
            0
        }
        (reason, Ok(())) => {
            info!(task, ?reason, "task stopped");
            1
        }
        (reason, Err(err)) => {
            warn!(task, ?reason, error = %err, "task failed");
            err.exit_code()
        }
    }
}

/// Simple dry-run output: the command as it would be launched.
fn print_dry_run(
    cfg: &ConfigFile,
    executor: &dyn Executor,
    options: &ExecutorOptions,
) -> Result<()> {
    let prepared = exec::launch::prepare(executor.command_spec(), options.interpolator.as_ref())?;

    println!("taskexec dry-run");
    println!("  task: {}", cfg.task.name);
    println!("  variant: {}", executor.variant());
    println!("  dir: {}", prepared.dir.display());
    println!("  path: {}", prepared.path);
    println!("  args: {:?}", prepared.args);
    println!("  env:");
    for entry in prepared.env.to_list() {
        println!("    {entry}");
    }
    if let Some(resources) = cfg.resources {
        println!(
            "  resources: cpu={} memory_mb={} disk_mb={} iops={}",
            resources.cpu, resources.memory_mb, resources.disk_mb, resources.iops
        );
    }
    if let Some(timeout) = cfg.task.timeout {
        println!("  timeout: {timeout:?}");
    }
    Ok(())
}
