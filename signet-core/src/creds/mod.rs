//! # Credential Management
//!
//! Acquisition, storage and retrieval of the sign-in credentials for a remote
//! build server, with one secret backend per platform.
//!
//! The read path runs from the [`PersistentStorageManager`] through the active
//! [`SecretBackend`] down to the output parsers in [`parser`]; every failure on
//! that path is absorbed and reported as "nothing stored".

use std::fmt;

pub mod backend;
pub mod error;
pub mod parser;
pub mod platform;
pub mod runner;
pub mod storage;

pub use backend::{BackendCapability, BackendKind, SecretBackend};
pub use error::{BackendError, BackendResult};
pub use storage::PersistentStorageManager;

/// One secret as a backend stores it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
  pub service: String,
  pub account: String,
  pub secret: Vec<u8>,
}

impl SecretRecord {
  pub fn new(service: impl Into<String>, account: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
    Self {
      service: service.into(),
      account: account.into(),
      secret: secret.into(),
    }
  }

  /// The secret as UTF-8, if it is valid UTF-8.
  pub fn secret_str(&self) -> Option<&str> {
    std::str::from_utf8(&self.secret).ok()
  }
}

impl fmt::Debug for SecretRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SecretRecord")
      .field("service", &self.service)
      .field("account", &self.account)
      .field("secret", &"<redacted>")
      .finish()
  }
}

/// Server URL, username and password as read back from persistent storage.
///
/// These have not been validated against the server; they only become
/// [`Credentials`] once the sign-in flow has authenticated them.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredentials {
  pub server_url: String,
  pub username: String,
  pub password: String,
}

impl StoredCredentials {
  pub fn new(server_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      server_url: server_url.into(),
      username: username.into(),
      password: password.into(),
    }
  }

  /// True when none of the three parts is empty.
  pub fn is_complete(&self) -> bool {
    !self.server_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
  }
}

impl fmt::Debug for StoredCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StoredCredentials")
      .field("server_url", &self.server_url)
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// An authenticated identity on a build server.
///
/// Only the sign-in flow can create one, after the server has accepted the
/// password and issued a session id and user id for it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  server_url: String,
  username: String,
  password: String,
  user_id: String,
  session_id: String,
}

impl Credentials {
  pub(crate) fn authenticated(login: StoredCredentials, session_id: String, user_id: String) -> Self {
    Self {
      server_url: login.server_url,
      username: login.username,
      password: login.password,
      user_id,
      session_id,
    }
  }

  pub fn server_url(&self) -> &str {
    &self.server_url
  }

  pub fn username(&self) -> &str {
    &self.username
  }

  pub fn password(&self) -> &str {
    &self.password
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn session_id(&self) -> &str {
    &self.session_id
  }

  /// A value without both ids was never accepted by the server.
  pub fn is_authenticated(&self) -> bool {
    !self.user_id.is_empty() && !self.session_id.is_empty()
  }

  /// The server URL, username and password without the session.
  pub fn to_stored(&self) -> StoredCredentials {
    StoredCredentials::new(&self.server_url, &self.username, &self.password)
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("server_url", &self.server_url)
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .field("user_id", &self.user_id)
      .field("session_id", &"<redacted>")
      .finish()
  }
}
