// src/resources.rs

//! Resource specification produced upstream by the scheduler.
//!
//! The executor treats this as read-only input: the portable variant only
//! checks that one was supplied, the restrictive variant turns it into
//! per-process limits.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct Resources {
    /// CPU shares in MHz.
    #[serde(default)]
    pub cpu: u32,

    /// Memory ceiling in megabytes.
    #[serde(default)]
    pub memory_mb: u64,

    /// Disk quota in megabytes.
    #[serde(default)]
    pub disk_mb: u64,

    #[serde(default)]
    pub iops: u32,
}

impl Resources {
    pub fn memory_bytes(&self) -> u64 {
        self.memory_mb.saturating_mul(1024 * 1024)
    }

    pub fn disk_bytes(&self) -> u64 {
        self.disk_mb.saturating_mul(1024 * 1024)
    }
}
