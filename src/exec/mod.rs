// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the [`Executor`] contract every variant implements.
//! - [`command`] holds the owned, lockable [`CommandSpec`].
//! - [`shared`] holds the process bookkeeping both variants share.
//! - [`launch`] is the start pipeline shared by the variants: interpolation,
//!   command construction, pid parsing.
//! - [`process`] owns live processes through a supervisor task so that
//!   `wait` and `force_stop` can race safely.
//! - [`portable`] runs tasks with no isolation; [`restrictive`] (unix) adds a
//!   private session, rlimits and graceful shutdown.
//! - [`factory`] picks the variant at construction time.

pub mod backend;
pub mod command;
pub mod factory;
pub mod launch;
pub mod portable;
pub mod process;
#[cfg(unix)]
pub mod restrictive;
pub mod shared;
pub mod sys;

pub use backend::{BoxFuture, Executor};
pub use command::CommandSpec;
pub use factory::{ExecutorOptions, new_executor, restrictive_supported, select_variant};
pub use portable::PortableExecutor;
pub use process::{ExitOutcome, Origin};
#[cfg(unix)]
pub use restrictive::{ProcessLimits, RestrictiveExecutor};
pub use sys::StopSignal;
