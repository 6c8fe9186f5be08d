// src/interp/mod.rs

//! Placeholder interpolation for command paths, arguments and environment.
//!
//! The executor does not care what a token *means*; it hands a string and a
//! name -> value mapping to an [`Interpolator`] and gets back the expanded
//! words. Both the task-directory pass and the environment pass route
//! through the same implementation.
//!
//! - [`args`] provides [`ShellInterpolator`], the default grammar: shell-style
//!   word splitting followed by `$NAME` / `${NAME}` replacement.
//! - [`env`] parses `KEY=VALUE` lists into a [`TaskEnv`].

pub mod args;
pub mod env;

use std::collections::HashMap;
use std::fmt::Debug;

use thiserror::Error;

pub use args::ShellInterpolator;
pub use env::{TaskEnv, TASK_DIR_VAR};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("unbalanced quoting in {input:?}")]
    UnbalancedQuotes { input: String },

    #[error("unterminated '${{' in {input:?}")]
    UnterminatedBrace { input: String },

    #[error("invalid variable name {name:?}")]
    InvalidName { name: String },

    #[error("malformed environment entry {entry:?} (expected KEY=VALUE)")]
    MalformedEnv { entry: String },
}

/// Token replacement capability.
///
/// Implementations must replace every recognised token using `vars` and fail
/// on malformed token syntax. Unrecognised names are left as they are.
pub trait Interpolator: Send + Sync + Debug {
    /// Split `input` into words, then replace tokens in each word.
    fn parse_and_replace(
        &self,
        input: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Vec<String>, InterpolationError>;

    /// Replace tokens in a single value without any word splitting.
    fn replace(
        &self,
        input: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, InterpolationError>;
}
