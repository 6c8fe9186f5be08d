// src/config/mod.rs

//! Task file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate it and convert it into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    AllocSection, ConfigFile, ExecutorSection, ExecutorSettings, RawConfigFile, TaskSection,
    TaskSpec,
};
pub use validate::parse_duration;
