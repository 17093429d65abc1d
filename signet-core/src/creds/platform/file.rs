//! Token file backend
//!
//! Keeps secrets in `credentials.json` in the user's config directory,
//! readable by the owner only. The file is not encrypted, so this backend
//! reports itself as not secure.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{FilePermissions, PlatformFilePermissions};
use crate::creds::{BackendCapability, BackendError, BackendKind, BackendResult, SecretBackend, SecretRecord};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
  version: u32,
  #[serde(default)]
  entries: Vec<TokenEntry>,
}

#[derive(Serialize, Deserialize)]
struct TokenEntry {
  service: String,
  account: String,
  /// Base64 of the secret bytes.
  secret: String,
}

impl std::fmt::Debug for TokenEntry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenEntry")
      .field("service", &self.service)
      .field("account", &self.account)
      .finish_non_exhaustive()
  }
}

impl TokenFile {
  fn position(&self, service: &str, account: &str) -> Option<usize> {
    self
      .entries
      .iter()
      .position(|entry| entry.service == service && entry.account == account)
  }
}

/// Secret backend storing an owner-only JSON file.
#[derive(Debug)]
pub struct FileTokenBackend {
  path: PathBuf,
  // Serializes read-modify-write cycles on the file.
  lock: Mutex<()>,
}

impl FileTokenBackend {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the file; a missing or unreadable file yields an empty store.
  async fn load(&self) -> BackendResult<TokenFile> {
    let content = match tokio::fs::read_to_string(&self.path).await {
      Ok(content) => content,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(TokenFile::default()),
      Err(err) => return Err(err.into()),
    };

    if content.trim().is_empty() {
      return Ok(TokenFile::default());
    }

    match serde_json::from_str::<TokenFile>(&content) {
      Ok(file) => Ok(file),
      Err(err) => {
        warn!(path = %self.path.display(), error = %err, "Ignoring unreadable token file");
        Ok(TokenFile::default())
      }
    }
  }

  /// Write the file through a temporary sibling so readers never see a torn file.
  async fn save(&self, file: &TokenFile) -> BackendResult<()> {
    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(file)?;
    let tmp_path = self.path.with_extension("json.tmp");
    let mut tmp_file = create_private(&tmp_path).await?;
    tmp_file.write_all(content.as_bytes()).await?;
    tmp_file.sync_all().await?;
    drop(tmp_file);

    let tmp = tmp_path.clone();
    tokio::task::spawn_blocking(move || PlatformFilePermissions::set_secure_permissions(&tmp))
      .await
      .map_err(|err| BackendError::Io(std::io::Error::other(err)))?
      .map_err(|err| BackendError::Io(std::io::Error::other(err)))?;

    tokio::fs::rename(&tmp_path, &self.path).await?;
    Ok(())
  }
}

/// Create `path` afresh, owner-only from the moment it exists.
///
/// A leftover file from an interrupted save is removed first, since its mode
/// would be kept.
async fn create_private(path: &Path) -> std::io::Result<tokio::fs::File> {
  match tokio::fs::remove_file(path).await {
    Ok(()) => {}
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
    Err(err) => return Err(err),
  }

  let mut options = tokio::fs::OpenOptions::new();
  options.write(true).create_new(true);
  #[cfg(unix)]
  options.mode(0o600);
  options.open(path).await
}

#[async_trait]
impl SecretBackend for FileTokenBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::LinuxFile)
  }

  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>> {
    let _guard = self.lock.lock().await;
    let file = self.load().await?;

    let Some(entry) = file.position(service, account).map(|idx| &file.entries[idx]) else {
      return Ok(None);
    };

    match STANDARD.decode(entry.secret.as_bytes()) {
      Ok(secret) => Ok(Some(SecretRecord::new(service, account, secret))),
      Err(err) => {
        warn!(service = %service, account = %account, error = %err, "Ignoring undecodable token entry");
        Ok(None)
      }
    }
  }

  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()> {
    let _guard = self.lock.lock().await;
    let mut file = self.load().await?;
    file.version = FORMAT_VERSION;

    let encoded = STANDARD.encode(secret);
    match file.position(service, account) {
      Some(idx) => file.entries[idx].secret = encoded,
      None => file.entries.push(TokenEntry {
        service: service.to_string(),
        account: account.to_string(),
        secret: encoded,
      }),
    }

    self.save(&file).await?;
    debug!(path = %self.path.display(), account = %account, "Stored secret in token file");
    Ok(())
  }

  async fn delete(&self, service: &str, account: &str) -> BackendResult<()> {
    let _guard = self.lock.lock().await;
    let mut file = self.load().await?;

    let Some(idx) = file.position(service, account) else {
      return Ok(());
    };
    file.entries.remove(idx);
    file.version = FORMAT_VERSION;

    self.save(&file).await?;
    debug!(path = %self.path.display(), account = %account, "Removed secret from token file");
    Ok(())
  }
}

/// Unix implementation of file permissions using chmod-style permissions
#[cfg(unix)]
pub struct UnixFilePermissions;

#[cfg(unix)]
impl FilePermissions for UnixFilePermissions {
  fn set_secure_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path).context("Failed to get file metadata")?.permissions();
    perms.set_mode(0o600); // Owner read/write only
    std::fs::set_permissions(path, perms).context("Failed to set secure permissions")
  }

  fn has_secure_permissions(path: &Path) -> anyhow::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path).context("Failed to get file metadata")?.permissions().mode();
    Ok(mode & 0o077 == 0)
  }
}

/// Windows relies on the profile directory ACLs; the file only has to exist.
#[cfg(windows)]
pub struct WindowsFilePermissions;

#[cfg(windows)]
impl FilePermissions for WindowsFilePermissions {
  fn set_secure_permissions(path: &Path) -> anyhow::Result<()> {
    std::fs::metadata(path).context("Failed to get file metadata")?;
    Ok(())
  }

  fn has_secure_permissions(path: &Path) -> anyhow::Result<bool> {
    Ok(path.exists())
  }
}
