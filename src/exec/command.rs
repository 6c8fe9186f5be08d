// src/exec/command.rs

//! Command specification owned by an executor.

use std::path::{Path, PathBuf};

use crate::errors::{ExecError, Result};

/// Executable, arguments, environment and working directory of a task.
///
/// `path`, `args` and `env` hold the raw, pre-interpolation values until the
/// process starts; after that they hold the launched values and every setter
/// fails with [`ExecError::CommandLocked`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    path: String,
    args: Vec<String>,
    env: Vec<String>,
    dir: Option<PathBuf>,
    started: bool,
}

impl CommandSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Raw `KEY=VALUE` entries.
    pub fn env(&self) -> &[String] {
        &self.env
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> Result<()> {
        self.ensure_unlocked()?;
        self.path = path.into();
        Ok(())
    }

    pub fn set_args<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_unlocked()?;
        self.args = args.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn push_arg(&mut self, arg: impl Into<String>) -> Result<()> {
        self.ensure_unlocked()?;
        self.args.push(arg.into());
        Ok(())
    }

    pub fn set_env<I, S>(&mut self, env: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_unlocked()?;
        self.env = env.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn push_env(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_unlocked()?;
        self.env.push(format!("{key}={value}"));
        Ok(())
    }

    pub(crate) fn bind_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.ensure_unlocked()?;
        self.dir = Some(dir);
        Ok(())
    }

    /// Record the values the process was launched with and lock the command.
    pub(crate) fn mark_started(&mut self, path: String, args: Vec<String>) {
        self.path = path;
        self.args = args;
        self.started = true;
    }

    /// Lock the command without touching its values (reattachment).
    pub(crate) fn lock(&mut self) {
        self.started = true;
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.started {
            Err(ExecError::CommandLocked)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_work_until_started() {
        let mut cmd = CommandSpec::new("/bin/echo");
        cmd.set_args(["a", "b"]).unwrap();
        cmd.push_arg("c").unwrap();
        cmd.push_env("K", "V").unwrap();

        assert_eq!(cmd.args(), ["a", "b", "c"]);
        assert_eq!(cmd.env(), ["K=V"]);
        assert!(cmd.dir().is_none());

        cmd.mark_started("/bin/echo".to_string(), vec!["x".to_string()]);

        assert!(matches!(cmd.set_path("/bin/true"), Err(ExecError::CommandLocked)));
        assert!(matches!(cmd.push_arg("d"), Err(ExecError::CommandLocked)));
        assert!(matches!(cmd.set_env(["A=1"]), Err(ExecError::CommandLocked)));
        assert!(matches!(
            cmd.bind_dir(PathBuf::from("/tmp")),
            Err(ExecError::CommandLocked)
        ));
        assert_eq!(cmd.path(), "/bin/echo");
        assert_eq!(cmd.args(), ["x"]);
    }
}
