//! Windows Credential Manager backend
//!
//! Talks to the credential helper that ships next to the executable
//! (`creds.exe`). Every secret is filed as a generic credential whose target
//! name is `service:account`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::executable_dir;
use crate::consts::ENV_CREDS_TOOL;
use crate::creds::parser::{encode_hex, wincred};
use crate::creds::runner::{ToolRunner, resolve_tool};
use crate::creds::{BackendCapability, BackendError, BackendKind, BackendResult, SecretBackend, SecretRecord};

const HELPER_NAME: &str = "creds.exe";

/// Secret backend driving the Windows credential helper.
#[derive(Debug, Clone)]
pub struct WinCredBackend {
  runner: ToolRunner,
}

impl WinCredBackend {
  pub fn new(tool: impl Into<PathBuf>, timeout: Duration) -> Self {
    Self {
      runner: ToolRunner::new(tool, timeout),
    }
  }

  /// Locate the helper: configured path, `SIGNET_CREDS_TOOL`, next to the
  /// executable, then `PATH`.
  pub fn resolve_tool(configured: Option<&Path>) -> PathBuf {
    let candidates: Vec<PathBuf> = executable_dir().map(|dir| dir.join(HELPER_NAME)).into_iter().collect();
    resolve_tool(configured, ENV_CREDS_TOOL, &candidates, HELPER_NAME)
  }

  async fn query(&self, target: &str) -> BackendResult<Option<SecretRecord>> {
    let output = match self.runner.run(&["-s", "-g", "-t", target]).await {
      Ok(output) => output,
      Err(BackendError::Unavailable { tool, reason }) => {
        debug!(tool = %tool, reason = %reason, "Credential helper unavailable, nothing stored");
        return Ok(None);
      }
      Err(err) => return Err(err),
    };

    if !output.success() {
      debug!(target = %target, exit_code = ?output.exit_code, "Credential helper found no entry");
      return Ok(None);
    }

    Ok(wincred::parse_listing(&output.stdout, target).into_record(|reason| {
      warn!(target = %target, reason = %reason, "Ignoring unreadable credential helper output");
    }))
  }
}

#[async_trait]
impl SecretBackend for WinCredBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::Windows)
  }

  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>> {
    let target = wincred::target_name(service, account);
    self.query(&target).await
  }

  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()> {
    let target = wincred::target_name(service, account);
    let blob = encode_hex(secret);

    let output = self.runner.run(&["-a", "-t", &target, "-u", account, "-p", &blob]).await?;
    if !output.success() {
      return Err(BackendError::unavailable(
        HELPER_NAME,
        format!("storing {target} failed with exit code {:?}", output.exit_code),
      ));
    }

    debug!(target = %target, "Stored secret in credential manager");
    Ok(())
  }

  async fn delete(&self, service: &str, account: &str) -> BackendResult<()> {
    let target = wincred::target_name(service, account);

    let output = self.runner.run(&["-d", "-g", "-t", &target]).await?;
    if output.success() {
      debug!(target = %target, "Removed secret from credential manager");
      return Ok(());
    }

    // The helper also fails when there is nothing to delete.
    if self.query(&target).await?.is_none() {
      debug!(target = %target, "No secret to remove");
      return Ok(());
    }

    Err(BackendError::unavailable(
      HELPER_NAME,
      format!("removing {target} failed with exit code {:?}", output.exit_code),
    ))
  }
}
