//! The secret backend contract shared by every platform implementation.

use std::fmt;

use async_trait::async_trait;

use super::{BackendResult, SecretRecord};

/// Which native mechanism a backend is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
  /// Windows Credential Manager through the bundled credential helper.
  Windows,
  /// macOS keychain through the `security` tool.
  MacOs,
  /// Owner-only token file in the user's config directory.
  LinuxFile,
  /// The platform store reached through the `keyring` crate.
  Keyring,
  /// Process memory only.
  Memory,
}

impl BackendKind {
  /// Whether secrets at rest are protected by the operating system.
  ///
  /// The token file only relies on file permissions, and the memory backend
  /// keeps nothing at rest, so neither qualifies.
  pub const fn is_secure(self) -> bool {
    matches!(self, Self::Windows | Self::MacOs | Self::Keyring)
  }

  pub const fn description(self) -> &'static str {
    match self {
      Self::Windows => "Windows Credential Manager",
      Self::MacOs => "macOS keychain",
      Self::LinuxFile => "token file",
      Self::Keyring => "native keyring",
      Self::Memory => "in-memory store",
    }
  }
}

impl fmt::Display for BackendKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.description())
  }
}

/// What a backend can promise about the secrets it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapability {
  pub kind: BackendKind,
  pub secure: bool,
  pub persistent: bool,
}

impl BackendCapability {
  pub const fn of(kind: BackendKind) -> Self {
    Self {
      kind,
      secure: kind.is_secure(),
      persistent: !matches!(kind, BackendKind::Memory),
    }
  }
}

/// Store, look up and remove one secret by service and account.
///
/// Implementations must treat a missing entry as `Ok(None)` on `get` and as a
/// no-op on `delete`, and `set` must overwrite an existing entry.
#[async_trait]
pub trait SecretBackend: Send + Sync {
  /// Describe the backend.
  fn capability(&self) -> BackendCapability;

  /// Look up a secret.
  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>>;

  /// Store or overwrite a secret.
  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()>;

  /// Remove a secret if present.
  async fn delete(&self, service: &str, account: &str) -> BackendResult<()>;
}
