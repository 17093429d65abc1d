//! Fake native tools for testing
//!
//! Backends that drive an external program are tested against small shell
//! scripts standing in for that program.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An executable shell script in a temporary directory, removed on drop
pub struct FakeToolGuard {
  /// The temporary directory holding the script
  pub temp_dir: TempDir,
  path: PathBuf,
}

impl FakeToolGuard {
  /// A tool that prints `stdout` and exits with `exit_code`, whatever its arguments
  pub fn new(name: &str, stdout: &str, exit_code: i32) -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let output_path = temp_dir.path().join(format!("{name}.out"));
    fs::write(&output_path, stdout).expect("Failed to write fake tool output");

    let body = format!("cat '{}'\nexit {exit_code}", output_path.display());
    Self::write(temp_dir, name, &body)
  }

  /// A tool running `body` as a shell script; `$1`, `$2`, ... are its arguments
  pub fn script(name: &str, body: &str) -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    Self::write(temp_dir, name, body)
  }

  /// A tool that sleeps for `secs` seconds before exiting successfully
  pub fn sleeping(name: &str, secs: u64) -> Self {
    Self::script(name, &format!("sleep {secs}"))
  }

  fn write(temp_dir: TempDir, name: &str, body: &str) -> Self {
    let path = temp_dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake tool");

    let mut perms = fs::metadata(&path).expect("Failed to get file metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to make fake tool executable");

    Self { temp_dir, path }
  }

  /// Get the path to the script
  pub fn path(&self) -> &Path {
    &self.path
  }
}
