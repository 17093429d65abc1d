//! In-memory backend, for tests and for platforms without any usable store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::creds::{BackendCapability, BackendKind, BackendResult, SecretBackend, SecretRecord};

/// Secrets held in process memory and lost on exit.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored secrets.
  pub async fn len(&self) -> usize {
    self.entries.lock().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.entries.lock().await.is_empty()
  }
}

#[async_trait]
impl SecretBackend for MemoryBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::Memory)
  }

  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>> {
    let entries = self.entries.lock().await;
    Ok(
      entries
        .get(&(service.to_string(), account.to_string()))
        .map(|secret| SecretRecord::new(service, account, secret.clone())),
    )
  }

  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()> {
    let mut entries = self.entries.lock().await;
    entries.insert((service.to_string(), account.to_string()), secret.to_vec());
    Ok(())
  }

  async fn delete(&self, service: &str, account: &str) -> BackendResult<()> {
    let mut entries = self.entries.lock().await;
    entries.remove(&(service.to_string(), account.to_string()));
    Ok(())
  }
}
