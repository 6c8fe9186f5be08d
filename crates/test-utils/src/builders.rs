use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use taskexec::allocdir::{AllocDir, TASK_LOCAL};
use taskexec::config::default_config_path;

/// A throwaway allocation directory with one directory per task.
///
/// Layout: `<root>/<task>/local`. The binding maps each task to its
/// `local` directory, which is what `$NOMAD_TASK_DIR` resolves to.
pub struct AllocFixture {
    pub root: TempDir,
    pub alloc: AllocDir,
}

impl AllocFixture {
    pub fn new(tasks: &[&str]) -> Self {
        let root = tempfile::tempdir().expect("creating alloc root");
        let mut alloc = AllocDir::new(root.path());
        for task in tasks {
            let dir = root.path().join(task).join(TASK_LOCAL);
            fs::create_dir_all(&dir).expect("creating task dir");
            alloc.insert_task_dir(*task, dir);
        }
        Self { root, alloc }
    }

    pub fn task_dir(&self, task: &str) -> PathBuf {
        self.alloc
            .task_dir(task)
            .expect("task not part of this fixture")
            .to_path_buf()
    }

    /// Write an executable shell script into the task directory.
    pub fn write_script(&self, task: &str, name: &str, body: &str) -> PathBuf {
        let path = self.task_dir(task).join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("writing script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("making script executable");
        }
        path
    }

    pub fn read(&self, task: &str, name: &str) -> String {
        fs::read_to_string(self.task_dir(task).join(name)).unwrap_or_default()
    }
}

/// Builder for task files, rendered as TOML.
pub struct TaskFileBuilder {
    isolation: Option<String>,
    kill_timeout: Option<String>,
    alloc_dir: PathBuf,
    task_dirs: Vec<(String, PathBuf)>,
    name: String,
    path: String,
    args: Vec<String>,
    env: Vec<String>,
    timeout: Option<String>,
    resources: Option<(u32, u64)>,
}

impl TaskFileBuilder {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            isolation: None,
            kill_timeout: None,
            alloc_dir: PathBuf::from("/alloc"),
            task_dirs: vec![],
            name: name.to_string(),
            path: path.to_string(),
            args: vec![],
            env: vec![],
            timeout: None,
            resources: Some((500, 256)),
        }
    }

    pub fn alloc(mut self, fixture: &AllocFixture) -> Self {
        self.alloc_dir = fixture.alloc.alloc_dir.clone();
        self.task_dirs = fixture
            .alloc
            .task_dirs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self
    }

    pub fn task_dir(mut self, task: &str, dir: impl AsRef<Path>) -> Self {
        self.task_dirs
            .push((task.to_string(), dir.as_ref().to_path_buf()));
        self
    }

    pub fn isolation(mut self, mode: &str) -> Self {
        self.isolation = Some(mode.to_string());
        self
    }

    pub fn kill_timeout(mut self, value: &str) -> Self {
        self.kill_timeout = Some(value.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, entry: &str) -> Self {
        self.env.push(entry.to_string());
        self
    }

    pub fn timeout(mut self, value: &str) -> Self {
        self.timeout = Some(value.to_string());
        self
    }

    pub fn resources(mut self, cpu: u32, memory_mb: u64) -> Self {
        self.resources = Some((cpu, memory_mb));
        self
    }

    pub fn without_resources(mut self) -> Self {
        self.resources = None;
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();

        out.push_str("[executor]\n");
        if let Some(ref isolation) = self.isolation {
            out.push_str(&format!("isolation = {}\n", quote(isolation)));
        }
        if let Some(ref kill_timeout) = self.kill_timeout {
            out.push_str(&format!("kill_timeout = {}\n", quote(kill_timeout)));
        }

        out.push_str("\n[alloc]\n");
        out.push_str(&format!("dir = {}\n", quote(&self.alloc_dir.to_string_lossy())));
        out.push_str("[alloc.task_dirs]\n");
        for (task, dir) in &self.task_dirs {
            out.push_str(&format!("{} = {}\n", quote(task), quote(&dir.to_string_lossy())));
        }

        out.push_str("\n[task]\n");
        out.push_str(&format!("name = {}\n", quote(&self.name)));
        out.push_str(&format!("path = {}\n", quote(&self.path)));
        out.push_str(&format!("args = [{}]\n", list(&self.args)));
        out.push_str(&format!("env = [{}]\n", list(&self.env)));
        if let Some(ref timeout) = self.timeout {
            out.push_str(&format!("timeout = {}\n", quote(timeout)));
        }

        if let Some((cpu, memory_mb)) = self.resources {
            out.push_str("\n[resources]\n");
            out.push_str(&format!("cpu = {cpu}\nmemory_mb = {memory_mb}\n"));
        }

        out
    }

    /// Write the task file into `dir` and return its path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> PathBuf {
        let path = dir.as_ref().join(default_config_path());
        fs::write(&path, self.build()).expect("writing task file");
        path
    }
}

/// TOML literal string; task paths and shell snippets never contain `'`.
fn quote(s: &str) -> String {
    format!("'{s}'")
}

fn list(items: &[String]) -> String {
    items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ")
}
