//! Environment variable management for testing
//!
//! Guards that change the process environment and put it back on drop, so a
//! test that points signet at temporary directories or fake tools leaves no
//! trace for the next one.

use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use tempfile::TempDir;

/// Points the XDG config and data directories at a per-test temporary
/// directory, which is what `ConfigDirs::new` resolves on Linux
pub struct EnvTestGuard {
  /// The temporary directory holding `config/` and `data/`
  pub temp_dir: TempDir,
  _config_home: EnvVarGuard,
  _data_home: EnvVarGuard,
}

impl Default for EnvTestGuard {
  fn default() -> Self {
    Self::new()
  }
}

impl EnvTestGuard {
  pub const XDG_CONFIG_HOME: &'static str = "XDG_CONFIG_HOME";
  pub const XDG_DATA_HOME: &'static str = "XDG_DATA_HOME";

  /// Create the temporary directories and override the XDG variables
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let config_dir = temp_dir.path().join("config");
    let data_dir = temp_dir.path().join("data");

    std::fs::create_dir_all(&config_dir).expect("Failed to create config directory");
    std::fs::create_dir_all(&data_dir).expect("Failed to create data directory");

    Self {
      _config_home: EnvVarGuard::set(Self::XDG_CONFIG_HOME, &config_dir),
      _data_home: EnvVarGuard::set(Self::XDG_DATA_HOME, &data_dir),
      temp_dir,
    }
  }

  /// Get the path to the XDG config directory
  pub fn config_dir(&self) -> PathBuf {
    self.temp_dir.path().join("config")
  }

  /// Get the path to the XDG data directory
  pub fn data_dir(&self) -> PathBuf {
    self.temp_dir.path().join("data")
  }
}

/// Sets one environment variable for the lifetime of the guard
pub struct EnvVarGuard {
  name: String,
  original: Option<String>,
}

impl EnvVarGuard {
  /// Set `name` to `value`
  pub fn set(name: &str, value: impl AsRef<OsStr>) -> Self {
    let original = env::var(name).ok();
    unsafe {
      env::set_var(name, value);
    }

    Self {
      name: name.to_string(),
      original,
    }
  }

  /// Remove `name` from the environment
  pub fn unset(name: &str) -> Self {
    let original = env::var(name).ok();
    unsafe {
      env::remove_var(name);
    }

    Self {
      name: name.to_string(),
      original,
    }
  }
}

impl Drop for EnvVarGuard {
  fn drop(&mut self) {
    match &self.original {
      Some(val) => unsafe {
        env::set_var(&self.name, val);
      },
      None => unsafe {
        env::remove_var(&self.name);
      },
    }
  }
}
