#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use taskexec::exec::{Executor, ExecutorOptions, new_executor};
use taskexec::interp::ShellInterpolator;
use taskexec::types::IsolationMode;

pub use taskexec_test_utils::builders::{AllocFixture, TaskFileBuilder};
pub use taskexec_test_utils::{init_tracing, with_timeout};

pub fn options(isolation: IsolationMode) -> ExecutorOptions {
    ExecutorOptions {
        isolation,
        kill_timeout: Duration::from_millis(300),
        reattach_poll_interval: Duration::from_millis(20),
        interpolator: Arc::new(ShellInterpolator),
    }
}

pub fn portable() -> Box<dyn Executor> {
    new_executor(&options(IsolationMode::Portable)).expect("portable executor")
}

#[cfg(unix)]
pub fn restrictive() -> Box<dyn Executor> {
    new_executor(&options(IsolationMode::Restrictive)).expect("restrictive executor")
}

/// Configure `exec` to run `path args...` in `task`'s directory.
pub fn configure(
    exec: &mut dyn Executor,
    fixture: &AllocFixture,
    task: &str,
    path: &str,
    args: &[&str],
    env: &[&str],
) {
    let cmd = exec.command();
    cmd.set_path(path).unwrap();
    cmd.set_args(args.iter().copied()).unwrap();
    cmd.set_env(env.iter().copied()).unwrap();
    exec.configure_task_dir(task, &fixture.alloc).unwrap();
}
