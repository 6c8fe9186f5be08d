// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

use crate::types::IsolationMode;

/// Command-line arguments for `taskexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskexec",
    version,
    about = "Launch, supervise and reattach to task processes.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the task described by a task file and wait for it to exit.
    Run {
        /// Path to the task file (TOML).
        #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
        config: PathBuf,

        /// Override `[executor].isolation` from the task file.
        #[arg(long, value_enum, value_name = "MODE")]
        isolation: Option<IsolationMode>,

        /// Validate and print the interpolated command without launching it.
        #[arg(long)]
        dry_run: bool,

        /// Print the pid on stdout once the process has started, for a later
        /// `reattach`.
        #[arg(long)]
        print_pid: bool,
    },

    /// Reattach to a running process by pid and wait for it to exit.
    Reattach {
        /// Decimal process id, as printed by `run`.
        #[arg(long, value_name = "PID")]
        pid: String,

        /// Kill the process instead of waiting for it.
        #[arg(long)]
        kill: bool,

        /// How often to probe the process for liveness.
        #[arg(long, value_name = "DURATION", default_value = "100ms")]
        poll: String,

        #[arg(long, value_enum, value_name = "MODE", default_value = "auto")]
        isolation: IsolationMode,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
