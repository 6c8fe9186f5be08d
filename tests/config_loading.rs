// tests/config_loading.rs

mod common;
use crate::common::{AllocFixture, TaskFileBuilder};

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use taskexec::config::load_and_validate;
use taskexec::errors::ExecError;
use taskexec::types::IsolationMode;

fn config_error(result: Result<taskexec::config::ConfigFile, ExecError>) -> String {
    match result {
        Err(ExecError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn full_task_file_round_trips_into_settings() {
    let fixture = AllocFixture::new(&["web", "db"]);
    let dir = tempfile::tempdir().unwrap();
    let path = TaskFileBuilder::new("web", "$NOMAD_TASK_DIR/server")
        .alloc(&fixture)
        .isolation("portable")
        .kill_timeout("2s")
        .arg("--port")
        .arg("${PORT}")
        .env("PORT=8080")
        .timeout("1m")
        .resources(250, 128)
        .write_to(dir.path());

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.executor.isolation, IsolationMode::Portable);
    assert_eq!(cfg.executor.kill_timeout, Duration::from_secs(2));
    assert_eq!(cfg.task.name, "web");
    assert_eq!(cfg.task.path, "$NOMAD_TASK_DIR/server");
    assert_eq!(cfg.task.args, vec!["--port", "${PORT}"]);
    assert_eq!(cfg.task.env, vec!["PORT=8080"]);
    assert_eq!(cfg.task.timeout, Some(Duration::from_secs(60)));
    assert_eq!(
        cfg.alloc.task_dir("db"),
        Some(fixture.task_dir("db").as_path())
    );

    let resources = cfg.resources.unwrap();
    assert_eq!(resources.cpu, 250);
    assert_eq!(resources.memory_mb, 128);

    let options = cfg.executor.to_options();
    assert_eq!(options.isolation, IsolationMode::Portable);
    assert_eq!(options.kill_timeout, Duration::from_secs(2));
}

#[test]
fn task_without_directory_binding_is_rejected() {
    let fixture = AllocFixture::new(&["db"]);
    let dir = tempfile::tempdir().unwrap();
    let path = TaskFileBuilder::new("web", "/bin/true")
        .alloc(&fixture)
        .write_to(dir.path());

    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("web"), "unexpected message: {msg}");
}

#[test]
fn relative_task_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = TaskFileBuilder::new("web", "/bin/true")
        .task_dir("web", "relative/web")
        .write_to(dir.path());

    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("absolute"), "unexpected message: {msg}");
}

#[test]
fn empty_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = TaskFileBuilder::new("web", "  ")
        .task_dir("web", "/alloc/web")
        .write_to(dir.path());

    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("empty"), "unexpected message: {msg}");
}

#[test]
fn bad_durations_name_the_field() {
    let dir = tempfile::tempdir().unwrap();

    let path = TaskFileBuilder::new("web", "/bin/true")
        .task_dir("web", "/alloc/web")
        .kill_timeout("soon")
        .write_to(dir.path());
    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("executor.kill_timeout"), "unexpected message: {msg}");

    let path = TaskFileBuilder::new("web", "/bin/true")
        .task_dir("web", "/alloc/web")
        .timeout("5d")
        .write_to(dir.path());
    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("task.timeout"), "unexpected message: {msg}");
}

#[test]
fn unknown_isolation_mode_is_a_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = TaskFileBuilder::new("web", "/bin/true")
        .task_dir("web", "/alloc/web")
        .isolation("chroot")
        .write_to(dir.path());

    assert!(matches!(
        load_and_validate(&path),
        Err(ExecError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(ExecError::IoError(_))
    ));
}

#[test]
fn resources_section_is_optional() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[alloc]
dir = "/alloc"
[alloc.task_dirs]
web = "/alloc/web"

[task]
name = "web"
path = "/bin/true"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.resources.is_none());
    assert_eq!(cfg.executor.isolation, IsolationMode::Auto);
}
