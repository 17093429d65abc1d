//! The credentials of the running session.

use tokio::sync::RwLock;
use tracing::debug;

use crate::creds::Credentials;

/// Holds at most one authenticated [`Credentials`] for the lifetime of the
/// process. Nothing here is ever written to disk.
#[derive(Debug, Default)]
pub struct SessionCredentialCache {
  current: RwLock<Option<Credentials>>,
}

impl SessionCredentialCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace the cached credentials.
  pub async fn set(&self, credentials: Credentials) {
    debug!(
      server_url = %credentials.server_url(),
      username = %credentials.username(),
      "Caching session credentials"
    );
    *self.current.write().await = Some(credentials);
  }

  pub async fn get(&self) -> Option<Credentials> {
    self.current.read().await.clone()
  }

  pub async fn clear(&self) {
    if self.current.write().await.take().is_some() {
      debug!("Cleared session credentials");
    }
  }

  pub async fn is_signed_in(&self) -> bool {
    self.current.read().await.is_some()
  }
}
