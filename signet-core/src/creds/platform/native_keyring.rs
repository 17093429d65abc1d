//! Backend on top of the `keyring` crate.
//!
//! `keyring` talks to the platform store directly and blocks, so every call
//! runs on the blocking pool. A write is read back before it counts as stored.

use async_trait::async_trait;
use keyring::{Entry, Error as KeyringError};
use tracing::debug;

use crate::creds::{BackendCapability, BackendError, BackendKind, BackendResult, SecretBackend, SecretRecord};

/// Secret backend using the native keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringBackend;

impl KeyringBackend {
  pub fn new() -> Self {
    Self
  }
}

fn keyring_error(err: KeyringError) -> BackendError {
  BackendError::unavailable("keyring", err.to_string())
}

async fn blocking<T, F>(f: F) -> BackendResult<T>
where
  F: FnOnce() -> BackendResult<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|err| BackendError::Io(std::io::Error::other(err)))?
}

#[async_trait]
impl SecretBackend for KeyringBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::Keyring)
  }

  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>> {
    let (service, account) = (service.to_string(), account.to_string());
    blocking(move || {
      let entry = Entry::new(&service, &account).map_err(keyring_error)?;
      match entry.get_secret() {
        Ok(secret) => Ok(Some(SecretRecord::new(service, account, secret))),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(err) => {
          debug!(error = %err, "Keyring lookup failed, nothing stored");
          Ok(None)
        }
      }
    })
    .await
  }

  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()> {
    let (service, account, secret) = (service.to_string(), account.to_string(), secret.to_vec());
    blocking(move || {
      let entry = Entry::new(&service, &account).map_err(keyring_error)?;
      entry.set_secret(&secret).map_err(keyring_error)?;

      // A fresh entry must see the write, otherwise nothing reached a real store.
      let check = Entry::new(&service, &account).map_err(keyring_error)?;
      match check.get_secret() {
        Ok(stored) if stored == secret => Ok(()),
        Ok(_) => Err(BackendError::unavailable("keyring", "stored secret does not match")),
        Err(err) => Err(BackendError::unavailable(
          "keyring",
          format!("secret did not persist: {err}"),
        )),
      }
    })
    .await
  }

  async fn delete(&self, service: &str, account: &str) -> BackendResult<()> {
    let (service, account) = (service.to_string(), account.to_string());
    blocking(move || {
      let entry = Entry::new(&service, &account).map_err(keyring_error)?;
      match entry.delete_credential() {
        Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
        Err(err) => Err(keyring_error(err)),
      }
    })
    .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SERVICE: &str = "signet-test";

  #[tokio::test]
  async fn test_stored_secret_is_found_again() {
    let backend = KeyringBackend::new();

    // Machines without a reachable secret store refuse the write outright.
    if let Err(err) = backend.set(SERVICE, "password", b"hunter2").await {
      assert!(matches!(err, BackendError::Unavailable { .. }), "got {err:?}");
      return;
    }

    let record = backend.get(SERVICE, "password").await.unwrap();
    assert_eq!(record.as_ref().and_then(SecretRecord::secret_str), Some("hunter2"));

    backend.delete(SERVICE, "password").await.unwrap();
    assert!(backend.get(SERVICE, "password").await.unwrap().is_none());
    backend.delete(SERVICE, "password").await.unwrap();
  }
}
