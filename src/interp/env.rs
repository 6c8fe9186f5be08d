// src/interp/env.rs

//! Task environment built from a raw `KEY=VALUE` list.

use std::collections::HashMap;
use std::path::Path;

use super::{InterpolationError, Interpolator};

/// Reserved variable bound to the task's directory.
pub const TASK_DIR_VAR: &str = "NOMAD_TASK_DIR";

/// Resolved environment of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEnv {
    vars: HashMap<String, String>,
}

impl TaskEnv {
    /// Parse a list of `KEY=VALUE` entries. The value may itself contain `=`;
    /// later duplicates win.
    pub fn parse_from_list<S: AsRef<str>>(entries: &[S]) -> Result<Self, InterpolationError> {
        let mut vars = HashMap::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let (key, value) = entry
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| InterpolationError::MalformedEnv {
                    entry: entry.to_string(),
                })?;
            vars.insert(key.to_string(), value.to_string());
        }
        Ok(Self { vars })
    }

    /// Bind [`TASK_DIR_VAR`] to `dir`. The variable is reserved: any value
    /// from the raw list is replaced.
    pub fn with_task_dir(mut self, dir: &Path) -> Self {
        self.vars
            .insert(TASK_DIR_VAR.to_string(), dir.to_string_lossy().into_owned());
        self
    }

    /// Expand tokens inside every value against the environment as it stands.
    ///
    /// One pass only: a value that expands to another token keeps it
    /// literally. The reserved task directory is never rewritten.
    pub fn resolve_values(self, interpolator: &dyn Interpolator) -> Result<Self, InterpolationError> {
        let mut vars = HashMap::with_capacity(self.vars.len());
        for (key, value) in &self.vars {
            let value = if key == TASK_DIR_VAR {
                value.clone()
            } else {
                interpolator.replace(value, &self.vars)?
            };
            vars.insert(key.clone(), value);
        }
        Ok(Self { vars })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn map(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// Entries as `KEY=VALUE` strings, sorted by key.
    pub fn to_list(&self) -> Vec<String> {
        let mut list: Vec<String> = self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
        list.sort();
        list
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ShellInterpolator;

    #[test]
    fn splits_on_first_equals() {
        let env = TaskEnv::parse_from_list(&["A=1", "OPTS=--x=y"]).unwrap();
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("OPTS"), Some("--x=y"));
    }

    #[test]
    fn empty_values_are_allowed() {
        let env = TaskEnv::parse_from_list(&["EMPTY="]).unwrap();
        assert_eq!(env.get("EMPTY"), Some(""));
    }

    #[test]
    fn rejects_entries_without_key_or_equals() {
        assert!(matches!(
            TaskEnv::parse_from_list(&["NOEQUALS"]),
            Err(InterpolationError::MalformedEnv { .. })
        ));
        assert!(matches!(
            TaskEnv::parse_from_list(&["=value"]),
            Err(InterpolationError::MalformedEnv { .. })
        ));
    }

    #[test]
    fn task_dir_is_reserved() {
        let env = TaskEnv::parse_from_list::<&str>(&[])
            .unwrap()
            .with_task_dir(Path::new("/alloc/web"));
        assert_eq!(env.get(TASK_DIR_VAR), Some("/alloc/web"));

        let env = TaskEnv::parse_from_list(&["NOMAD_TASK_DIR=/custom"])
            .unwrap()
            .with_task_dir(Path::new("/alloc/web"));
        assert_eq!(env.get(TASK_DIR_VAR), Some("/alloc/web"));
        assert_eq!(env.to_list(), vec!["NOMAD_TASK_DIR=/alloc/web".to_string()]);
    }

    #[test]
    fn values_are_expanded_against_the_bound_dir() {
        let env = TaskEnv::parse_from_list(&[
            "NOMAD_TASK_DIR=/custom",
            "DATA=$NOMAD_TASK_DIR/data",
            "URL=http://${HOST}:${PORT}",
            "HOST=localhost",
            "PORT=8080",
            "LEFT=$UNSET",
        ])
        .unwrap()
        .with_task_dir(Path::new("/alloc/web"))
        .resolve_values(&ShellInterpolator)
        .unwrap();

        assert_eq!(env.get(TASK_DIR_VAR), Some("/alloc/web"));
        assert_eq!(env.get("DATA"), Some("/alloc/web/data"));
        assert_eq!(env.get("URL"), Some("http://localhost:8080"));
        assert_eq!(env.get("LEFT"), Some("$UNSET"));
    }

    #[test]
    fn malformed_value_tokens_are_rejected() {
        let err = TaskEnv::parse_from_list(&["DATA=${NOMAD_TASK_DIR"])
            .unwrap()
            .with_task_dir(Path::new("/alloc/web"))
            .resolve_values(&ShellInterpolator)
            .unwrap_err();
        assert!(matches!(err, InterpolationError::UnterminatedBrace { .. }));
    }
}
