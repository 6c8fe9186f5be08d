// src/allocdir.rs

//! Task directory binding owned by the allocation directory manager.
//!
//! The executor only ever reads one entry (its own task name) from
//! [`AllocDir::task_dirs`]; creating and cleaning up the directories is the
//! manager's business.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the per-task local directory inside a task directory.
pub const TASK_LOCAL: &str = "local";

#[derive(Debug, Clone, Default)]
pub struct AllocDir {
    /// Root directory of the allocation.
    pub alloc_dir: PathBuf,

    /// Task name -> absolute task directory.
    pub task_dirs: BTreeMap<String, PathBuf>,
}

impl AllocDir {
    pub fn new(alloc_dir: impl Into<PathBuf>) -> Self {
        Self {
            alloc_dir: alloc_dir.into(),
            task_dirs: BTreeMap::new(),
        }
    }

    /// Bind `task` to `dir`, replacing any previous binding.
    pub fn insert_task_dir(&mut self, task: impl Into<String>, dir: impl Into<PathBuf>) {
        self.task_dirs.insert(task.into(), dir.into());
    }

    pub fn task_dir(&self, task: &str) -> Option<&Path> {
        self.task_dirs.get(task).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_keyed_by_task_name() {
        let mut alloc = AllocDir::new("/var/alloc/abc");
        alloc.insert_task_dir("web", "/var/alloc/abc/web");

        assert_eq!(alloc.task_dir("web"), Some(Path::new("/var/alloc/abc/web")));
        assert_eq!(alloc.task_dir("db"), None);
    }
}
