//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway source tree plus a scratch area for configs and scripts.
pub struct TestTree {
    pub temp: TempDir,
}

/// Outcome of one `reprotest` invocation.
#[derive(Debug)]
pub struct RunResult {
    pub code: Option<i32>,
    pub stderr: String,
}

impl TestTree {
    /// Create a source tree holding a single `input.txt`.
    pub fn create() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        fs::create_dir(temp.path().join("source")).expect("create source dir");
        fs::write(temp.path().join("source/input.txt"), "reproducible\n").expect("write input");
        Self { temp }
    }

    pub fn source(&self) -> PathBuf {
        self.temp.path().join("source")
    }

    /// Write an executable shell script outside the source tree.
    #[allow(dead_code)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        make_executable(&path);
        path
    }

    /// Run `reprotest` with `--source-root` pointing at this tree.
    ///
    /// The working directory is the scratch area so no stray `.reprotestrc`
    /// is picked up.
    pub fn run(&self, args: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_reprotest"))
            .arg("--source-root")
            .arg(self.source())
            .args(args)
            .current_dir(self.temp.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn reprotest");
        RunResult::from(output)
    }

    /// Run `reprotest` from the scratch area with no extra arguments.
    #[allow(dead_code)]
    pub fn run_bare(&self, args: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_reprotest"))
            .args(args)
            .current_dir(self.temp.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn reprotest");
        RunResult::from(output)
    }
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path).expect("stat script").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("chmod script");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Host tools the end-to-end tests shell out to.
pub fn tools_available(tools: &[&str]) -> bool {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| find_in_path(tool).is_none() && !Path::new(tool).is_file())
        .collect();
    if !missing.is_empty() {
        eprintln!("Skipping: {} not available", missing.join(", "));
    }
    missing.is_empty()
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
