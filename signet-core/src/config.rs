//! # Configuration Management
//!
//! Handles application configuration, directory management, and the tunables
//! of the sign-in flow, including XDG base directory support.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_SERVER_URL, DEFAULT_TOOL_TIMEOUT_SECS, TOKEN_FILE_NAME};

/// Represents the configuration directories for the signet application
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
}

impl ConfigDirs {
  /// Create a new ConfigDirs instance
  pub fn new() -> Result<Self> {
    let proj_dirs = ProjectDirs::from("eddieland", "", "signet").context("Failed to determine project directories")?;

    Ok(Self {
      config_dir: proj_dirs.config_dir().to_path_buf(),
      data_dir: proj_dirs.data_dir().to_path_buf(),
    })
  }

  /// Directories rooted somewhere other than the user's profile.
  pub fn at(root: &Path) -> Self {
    Self {
      config_dir: root.join("config"),
      data_dir: root.join("data"),
    }
  }

  /// Get the config directory
  pub fn config_dir(&self) -> &PathBuf {
    &self.config_dir
  }

  /// Get the data directory
  pub fn data_dir(&self) -> &PathBuf {
    &self.data_dir
  }

  /// Initialize the configuration directories
  pub fn init(&self) -> Result<()> {
    fs::create_dir_all(&self.config_dir).context("Failed to create config directory")?;
    fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
    Ok(())
  }

  /// Get the path to the configuration file
  pub fn config_path(&self) -> PathBuf {
    self.config_dir.join("config.toml")
  }

  /// Get the path to the user settings file
  pub fn settings_path(&self) -> PathBuf {
    self.config_dir.join("settings.toml")
  }

  /// Get the path to the token file used by the file backend
  pub fn token_path(&self) -> PathBuf {
    self.config_dir.join(TOKEN_FILE_NAME)
  }

  /// Load the configuration from file or return defaults
  pub fn load_config(&self) -> Result<SignetConfig> {
    SignetConfig::load(&self.config_path())
  }
}

/// Get the configuration directories
pub fn get_config_dirs() -> Result<ConfigDirs> {
  ConfigDirs::new()
}

/// Deadlines for the operations that wait on something outside the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
  /// Remote validation round-trip, in seconds.
  pub remote_validation_secs: u64,
  /// One native credential tool invocation, in seconds.
  pub native_tool_secs: u64,
}

impl Default for TimeoutConfig {
  fn default() -> Self {
    Self {
      remote_validation_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
      native_tool_secs: DEFAULT_TOOL_TIMEOUT_SECS,
    }
  }
}

impl TimeoutConfig {
  pub fn remote_validation(&self) -> Duration {
    Duration::from_secs(self.remote_validation_secs.max(1))
  }

  pub fn native_tool(&self) -> Duration {
    Duration::from_secs(self.native_tool_secs.max(1))
  }
}

/// Behaviour of the sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInConfig {
  /// Server URL suggested when none was used before.
  pub default_server_url: String,
  /// How many times the user is asked again after the server rejects a password.
  pub max_interactive_attempts: u32,
}

impl Default for SignInConfig {
  fn default() -> Self {
    Self {
      default_server_url: DEFAULT_SERVER_URL.to_string(),
      max_interactive_attempts: 1,
    }
  }
}

/// Locations of the native credential tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
  /// The Windows credential helper (`creds.exe`).
  pub windows_credential_helper: Option<PathBuf>,
  /// The macOS `security` tool.
  pub macos_security: Option<PathBuf>,
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignetConfig {
  pub timeouts: TimeoutConfig,
  pub signin: SignInConfig,
  pub tools: ToolConfig,
}

impl SignetConfig {
  /// Load from `path`, falling back to defaults when the file does not exist.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
  }

  /// Save to `path`, creating the parent directory when needed.
  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(path, content).with_context(|| format!("Failed to write config to {}", path.display()))
  }
}
