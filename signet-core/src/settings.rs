//! # User Settings
//!
//! The small set of user choices the sign-in flow reads and writes: whether
//! to ask before storing credentials, whether to greet after sign-in, and the
//! last server URL and username used. None of these are secret.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Values of the user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Offer to store credentials after an interactive sign-in.
  pub ask_to_store_credentials: bool,
  /// Show a welcome notice after signing in.
  pub show_welcome: bool,
  pub last_server_url: Option<String>,
  pub last_username: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      ask_to_store_credentials: true,
      show_welcome: true,
      last_server_url: None,
      last_username: None,
    }
  }
}

/// Access to the user settings.
pub trait SettingsStore: Send + Sync {
  fn load(&self) -> Result<Settings>;

  fn save(&self, settings: &Settings) -> Result<()>;

  /// Load, change and save in one step.
  fn update(&self, change: &mut dyn FnMut(&mut Settings)) -> Result<Settings> {
    let mut settings = self.load()?;
    change(&mut settings);
    self.save(&settings)?;
    Ok(settings)
  }
}

/// Settings kept in a TOML file.
#[derive(Debug, Clone)]
pub struct FileSettings {
  path: PathBuf,
}

impl FileSettings {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl SettingsStore for FileSettings {
  fn load(&self) -> Result<Settings> {
    if !self.path.exists() {
      return Ok(Settings::default());
    }

    let content = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse settings from {}", self.path.display()))
  }

  fn save(&self, settings: &Settings) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")?;
    fs::write(&self.path, content).with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
    debug!(path = %self.path.display(), "Saved settings");
    Ok(())
  }
}

/// Settings held in memory.
#[derive(Debug, Default)]
pub struct MemorySettings {
  settings: Mutex<Settings>,
}

impl MemorySettings {
  pub fn new(settings: Settings) -> Self {
    Self {
      settings: Mutex::new(settings),
    }
  }
}

impl SettingsStore for MemorySettings {
  fn load(&self) -> Result<Settings> {
    let settings = self
      .settings
      .lock()
      .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
    Ok(settings.clone())
  }

  fn save(&self, settings: &Settings) -> Result<()> {
    let mut current = self
      .settings
      .lock()
      .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
    *current = settings.clone();
    Ok(())
  }
}
