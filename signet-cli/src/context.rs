//! # Application Context
//!
//! Builds the collaborators every command works with: configuration
//! directories, the storage manager on the platform backend, the session
//! cache and the settings file.

use std::sync::Arc;

use anyhow::{Context, Result};
use signet_core::signin::{Prompter, SignInFlow, SignInOptions};
use signet_core::{ConfigDirs, FileSettings, PersistentStorageManager, SessionCredentialCache, SignetConfig};
use signet_remote::LoginClient;
use tracing::debug;

/// Shared state for one CLI invocation
pub struct AppContext {
  pub dirs: ConfigDirs,
  pub config: SignetConfig,
  pub storage: Arc<PersistentStorageManager>,
  pub cache: Arc<SessionCredentialCache>,
  pub settings: Arc<FileSettings>,
}

impl AppContext {
  /// Load configuration from the user's config directory
  pub fn load() -> Result<Self> {
    let dirs = signet_core::get_config_dirs()?;
    dirs.init()?;
    let config = dirs.load_config()?;
    Ok(Self::from_parts(dirs, config))
  }

  /// Wire the collaborators for already loaded configuration
  pub fn from_parts(dirs: ConfigDirs, config: SignetConfig) -> Self {
    let storage = Arc::new(PersistentStorageManager::for_current_platform(&config, &dirs));
    debug!(backend = %storage.capability().kind, "Using secret backend");

    Self {
      settings: Arc::new(FileSettings::new(dirs.settings_path())),
      cache: Arc::new(SessionCredentialCache::new()),
      storage,
      dirs,
      config,
    }
  }

  /// A sign-in flow talking to the real server
  pub fn sign_in_flow(&self, prompter: Arc<dyn Prompter>) -> Result<SignInFlow> {
    let options = SignInOptions::from_config(&self.config);
    let login = LoginClient::new(options.remote_timeout).context("Failed to create login client")?;

    Ok(SignInFlow::new(
      self.storage.clone(),
      self.cache.clone(),
      Arc::new(login),
      prompter,
      self.settings.clone(),
      options,
    ))
  }
}
