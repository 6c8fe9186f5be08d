use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// Which executor implementation the factory should prefer.
///
/// - `Auto`: restrictive where the host supports it, portable otherwise
///   (default).
/// - `Portable`: always the portable variant, no isolation.
/// - `Restrictive`: require the restrictive variant; construction fails on
///   hosts that cannot support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    #[default]
    Auto,
    Portable,
    Restrictive,
}

/// The concrete implementation backing an `Executor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Portable,
    Restrictive,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Portable => f.write_str("portable"),
            Variant::Restrictive => f.write_str("restrictive"),
        }
    }
}
