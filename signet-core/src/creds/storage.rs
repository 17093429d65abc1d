//! Persistence of the sign-in credentials.
//!
//! A sign-in is stored as three records under [`SERVICE_NAME`]: the server URL,
//! the username and the password, each under its own account. The manager is
//! the only place that knows this layout.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BackendCapability, BackendResult, Credentials, SecretBackend, StoredCredentials, platform};
use crate::config::{ConfigDirs, SignetConfig};
use crate::consts::{ACCOUNT_PASSWORD, ACCOUNT_SERVER_URL, ACCOUNT_USERNAME, SERVICE_NAME};

const ACCOUNTS: [&str; 3] = [ACCOUNT_SERVER_URL, ACCOUNT_USERNAME, ACCOUNT_PASSWORD];

/// Reads, writes and deletes the persisted sign-in on one backend.
///
/// Operations are serialized, so a concurrent read never sees half of a
/// write.
pub struct PersistentStorageManager {
  backend: Arc<dyn SecretBackend>,
  lock: Mutex<()>,
}

impl PersistentStorageManager {
  pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
    Self {
      backend,
      lock: Mutex::new(()),
    }
  }

  /// A manager on the backend detected for the running platform.
  pub fn for_current_platform(config: &SignetConfig, dirs: &ConfigDirs) -> Self {
    Self::new(platform::create_platform_backend(config, dirs))
  }

  pub fn capability(&self) -> BackendCapability {
    self.backend.capability()
  }

  /// Read one record as text, `None` when absent, unreadable or empty.
  async fn read_part(&self, account: &str) -> Option<String> {
    let record = match self.backend.get(SERVICE_NAME, account).await {
      Ok(Some(record)) => record,
      Ok(None) => {
        debug!(account = %account, "No persisted value");
        return None;
      }
      Err(err) => {
        warn!(account = %account, error = %err, "Could not read persisted value");
        return None;
      }
    };

    match String::from_utf8(record.secret) {
      Ok(value) if !value.is_empty() => Some(value),
      Ok(_) => None,
      Err(_) => {
        warn!(account = %account, "Persisted value is not valid UTF-8");
        None
      }
    }
  }

  /// The persisted sign-in, or `None` if any part is missing or unreadable.
  ///
  /// Never fails: backend errors are logged and reported as nothing stored.
  pub async fn get_credentials(&self) -> Option<StoredCredentials> {
    let _guard = self.lock.lock().await;

    let server_url = self.read_part(ACCOUNT_SERVER_URL).await?;
    let username = self.read_part(ACCOUNT_USERNAME).await?;
    let password = self.read_part(ACCOUNT_PASSWORD).await?;

    debug!(server_url = %server_url, username = %username, "Loaded persisted credentials");
    Some(StoredCredentials::new(server_url, username, password))
  }

  /// Persist an authenticated sign-in, replacing any previous one.
  ///
  /// The previous records are removed first and the password is written last,
  /// so a write failing midway leaves an incomplete record that reads as
  /// absent, never new values next to an old password.
  pub async fn set_credentials(&self, credentials: &Credentials) -> BackendResult<()> {
    let _guard = self.lock.lock().await;

    for account in ACCOUNTS {
      self.backend.delete(SERVICE_NAME, account).await?;
    }

    let parts = [
      (ACCOUNT_SERVER_URL, credentials.server_url()),
      (ACCOUNT_USERNAME, credentials.username()),
      (ACCOUNT_PASSWORD, credentials.password()),
    ];
    for (account, value) in parts {
      self.backend.set(SERVICE_NAME, account, value.as_bytes()).await?;
    }

    info!(
      server_url = %credentials.server_url(),
      username = %credentials.username(),
      backend = %self.backend.capability().kind,
      "Persisted credentials"
    );
    Ok(())
  }

  /// Remove the persisted sign-in. Removing nothing is not an error.
  ///
  /// Every record is attempted even after a failure; the first failure is
  /// returned.
  pub async fn remove_credentials(&self) -> BackendResult<()> {
    let _guard = self.lock.lock().await;

    let mut first_error = None;
    for account in ACCOUNTS {
      if let Err(err) = self.backend.delete(SERVICE_NAME, account).await {
        warn!(account = %account, error = %err, "Could not remove persisted value");
        first_error.get_or_insert(err);
      }
    }

    match first_error {
      Some(err) => Err(err),
      None => {
        debug!("Removed persisted credentials");
        Ok(())
      }
    }
  }
}
