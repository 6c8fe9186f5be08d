// src/config/validate.rs

use std::time::Duration;

use crate::allocdir::AllocDir;
use crate::config::model::{ConfigFile, ExecutorSettings, RawConfigFile, TaskSpec};
use crate::errors::{ExecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_task(&raw)?;
        validate_task_dir(&raw)?;

        let executor = ExecutorSettings {
            isolation: raw.executor.isolation,
            kill_timeout: parse_field("executor.kill_timeout", &raw.executor.kill_timeout)?,
            reattach_poll_interval: parse_field(
                "executor.reattach_poll_interval",
                &raw.executor.reattach_poll_interval,
            )?,
        };
        if executor.reattach_poll_interval.is_zero() {
            return Err(ExecError::ConfigError(
                "[executor].reattach_poll_interval must be greater than zero".to_string(),
            ));
        }

        let timeout = raw
            .task
            .timeout
            .as_deref()
            .map(|s| parse_field("task.timeout", s))
            .transpose()?;

        let mut alloc = AllocDir::new(raw.alloc.dir);
        for (name, dir) in raw.alloc.task_dirs {
            alloc.insert_task_dir(name, dir);
        }

        let task = TaskSpec {
            name: raw.task.name,
            path: raw.task.path,
            args: raw.task.args,
            env: raw.task.env,
            timeout,
        };

        Ok(ConfigFile::new_unchecked(executor, alloc, task, raw.resources))
    }
}

fn validate_task(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.name.trim().is_empty() {
        return Err(ExecError::ConfigError(
            "[task].name must not be empty".to_string(),
        ));
    }
    if cfg.task.path.trim().is_empty() {
        return Err(ExecError::ConfigError(format!(
            "task '{}' has an empty `path`",
            cfg.task.name
        )));
    }
    Ok(())
}

fn validate_task_dir(cfg: &RawConfigFile) -> Result<()> {
    match cfg.alloc.task_dirs.get(&cfg.task.name) {
        None => Err(ExecError::ConfigError(format!(
            "task '{}' has no entry in [alloc.task_dirs]",
            cfg.task.name
        ))),
        Some(dir) if !dir.is_absolute() => Err(ExecError::ConfigError(format!(
            "task directory for '{}' must be absolute (got {:?})",
            cfg.task.name, dir
        ))),
        Some(_) => Ok(()),
    }
}

fn parse_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| ExecError::ConfigError(format!("{field}: {e}")))
}

/// Parse a duration like `"500ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 3s ").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn oversized_durations_are_errors() {
        let err = parse_duration("9999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "unexpected message: {err}");
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[alloc]
dir = "/alloc"
[alloc.task_dirs]
web = "/alloc/web"

[task]
name = "web"
path = "/bin/true"
"#,
        )
        .unwrap();

        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.executor.kill_timeout, Duration::from_secs(5));
        assert_eq!(
            cfg.executor.reattach_poll_interval,
            Duration::from_millis(100)
        );
        assert!(cfg.resources.is_none());
        assert!(cfg.task.timeout.is_none());
        assert_eq!(
            cfg.alloc.task_dir("web"),
            Some(std::path::Path::new("/alloc/web"))
        );
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[executor]
reattach_poll_interval = "0ms"

[alloc]
dir = "/alloc"
[alloc.task_dirs]
web = "/alloc/web"

[task]
name = "web"
path = "/bin/true"
"#,
        )
        .unwrap();

        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(ExecError::ConfigError(_))
        ));
    }
}
