//! Platform-specific secret backends
//!
//! One [`SecretBackend`] per platform: the Windows credential helper, the
//! macOS `security` tool and an owner-only token file elsewhere. With the
//! `native-keyring` feature the `keyring` crate replaces all three.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::{BackendKind, SecretBackend};
use crate::config::{ConfigDirs, SignetConfig};

mod file;
#[cfg(feature = "native-keyring")]
mod native_keyring;
mod macos;
mod memory;
mod windows;

pub use file::FileTokenBackend;
#[cfg(unix)]
pub use file::UnixFilePermissions;
#[cfg(windows)]
pub use file::WindowsFilePermissions;
#[cfg(feature = "native-keyring")]
pub use native_keyring::KeyringBackend;
pub use macos::KeychainBackend;
pub use memory::MemoryBackend;
pub use windows::WinCredBackend;

/// Trait for platform-specific file permission operations
pub trait FilePermissions {
  /// Set owner-only permissions on a credential file
  fn set_secure_permissions(path: &Path) -> Result<()>;

  /// Check if a file is readable by its owner only
  fn has_secure_permissions(path: &Path) -> Result<bool>;
}

/// Permission handling for the platform this binary was built for
#[cfg(unix)]
pub type PlatformFilePermissions = UnixFilePermissions;
#[cfg(windows)]
pub type PlatformFilePermissions = WindowsFilePermissions;

/// The backend native to the operating system, ignoring crate features.
pub fn os_backend_kind() -> BackendKind {
  match std::env::consts::OS {
    "windows" => BackendKind::Windows,
    "macos" => BackendKind::MacOs,
    _ => BackendKind::LinuxFile,
  }
}

/// The backend the current build should use.
pub fn detect_backend_kind() -> BackendKind {
  if cfg!(feature = "native-keyring") {
    BackendKind::Keyring
  } else {
    os_backend_kind()
  }
}

/// Build the backend of `kind`.
pub fn create_backend(kind: BackendKind, config: &SignetConfig, dirs: &ConfigDirs) -> Arc<dyn SecretBackend> {
  let tool_timeout = config.timeouts.native_tool();
  debug!(backend = %kind, "Creating secret backend");

  match kind {
    BackendKind::Windows => Arc::new(WinCredBackend::new(
      WinCredBackend::resolve_tool(config.tools.windows_credential_helper.as_deref()),
      tool_timeout,
    )),
    BackendKind::MacOs => Arc::new(KeychainBackend::new(
      KeychainBackend::resolve_tool(config.tools.macos_security.as_deref()),
      tool_timeout,
    )),
    BackendKind::LinuxFile => Arc::new(FileTokenBackend::new(dirs.token_path())),
    #[cfg(feature = "native-keyring")]
    BackendKind::Keyring => Arc::new(KeyringBackend::new()),
    #[cfg(not(feature = "native-keyring"))]
    BackendKind::Keyring => create_backend(os_backend_kind(), config, dirs),
    BackendKind::Memory => Arc::new(MemoryBackend::new()),
  }
}

/// The backend for the current platform.
pub fn create_platform_backend(config: &SignetConfig, dirs: &ConfigDirs) -> Arc<dyn SecretBackend> {
  create_backend(detect_backend_kind(), config, dirs)
}

/// Directory of the running executable, where the Windows helper ships.
pub(crate) fn executable_dir() -> Option<PathBuf> {
  std::env::current_exe().ok()?.parent().map(Path::to_path_buf)
}
