//! macOS keychain backend
//!
//! Drives `/usr/bin/security`. A lookup takes two calls: one for the item
//! attributes and one with `-w` to reveal the password. The password is
//! passed to `add-generic-password` on the command line, which is visible to
//! other processes of the same user while the tool runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::consts::ENV_SECURITY_TOOL;
use crate::creds::parser::keychain;
use crate::creds::runner::{ToolOutput, ToolRunner, resolve_tool};
use crate::creds::{BackendCapability, BackendError, BackendKind, BackendResult, SecretBackend, SecretRecord};

const SECURITY_TOOL: &str = "security";
const SECURITY_PATH: &str = "/usr/bin/security";

/// Exit status of `security` when no matching item exists.
const ITEM_NOT_FOUND: i32 = 44;

/// Secret backend driving the macOS `security` tool.
#[derive(Debug, Clone)]
pub struct KeychainBackend {
  runner: ToolRunner,
}

fn not_found(output: &ToolOutput) -> bool {
  output.exit_code == Some(ITEM_NOT_FOUND)
}

impl KeychainBackend {
  pub fn new(tool: impl Into<PathBuf>, timeout: Duration) -> Self {
    Self {
      runner: ToolRunner::new(tool, timeout),
    }
  }

  /// Locate the tool: configured path, `SIGNET_SECURITY_TOOL`, the system
  /// location, then `PATH`.
  pub fn resolve_tool(configured: Option<&Path>) -> PathBuf {
    resolve_tool(configured, ENV_SECURITY_TOOL, &[PathBuf::from(SECURITY_PATH)], SECURITY_TOOL)
  }

  /// Run a lookup, mapping "not installed" and any failed exit to `None`.
  async fn lookup(&self, args: &[&str]) -> BackendResult<Option<String>> {
    let output = match self.runner.run(args).await {
      Ok(output) => output,
      Err(BackendError::Unavailable { tool, reason }) => {
        debug!(tool = %tool, reason = %reason, "Keychain tool unavailable, nothing stored");
        return Ok(None);
      }
      Err(err) => return Err(err),
    };

    if not_found(&output) {
      return Ok(None);
    }
    if !output.success() {
      debug!(exit_code = ?output.exit_code, "Keychain lookup failed, nothing stored");
      return Ok(None);
    }
    Ok(Some(output.stdout))
  }
}

#[async_trait]
impl SecretBackend for KeychainBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::MacOs)
  }

  async fn get(&self, service: &str, account: &str) -> BackendResult<Option<SecretRecord>> {
    let Some(attributes) = self
      .lookup(&["find-generic-password", "-s", service, "-a", account])
      .await?
    else {
      return Ok(None);
    };

    let Some(secret) = self
      .lookup(&["find-generic-password", "-s", service, "-a", account, "-w"])
      .await?
    else {
      return Ok(None);
    };

    Ok(keychain::parse_item(&attributes, &secret, service, account).into_record(|reason| {
      warn!(service = %service, account = %account, reason = %reason, "Ignoring unreadable keychain output");
    }))
  }

  async fn set(&self, service: &str, account: &str, secret: &[u8]) -> BackendResult<()> {
    let secret = std::str::from_utf8(secret).map_err(|_| BackendError::malformed("keychain secrets must be UTF-8"))?;

    let output = self
      .runner
      .run(&["add-generic-password", "-U", "-s", service, "-a", account, "-w", secret])
      .await?;
    if !output.success() {
      return Err(BackendError::unavailable(
        SECURITY_TOOL,
        format!("add-generic-password failed with exit code {:?}", output.exit_code),
      ));
    }

    debug!(service = %service, account = %account, "Stored secret in keychain");
    Ok(())
  }

  async fn delete(&self, service: &str, account: &str) -> BackendResult<()> {
    let output = self
      .runner
      .run(&["delete-generic-password", "-s", service, "-a", account])
      .await?;

    if output.success() || not_found(&output) {
      debug!(service = %service, account = %account, "Removed secret from keychain");
      return Ok(());
    }

    Err(BackendError::unavailable(
      SECURITY_TOOL,
      format!("delete-generic-password failed with exit code {:?}", output.exit_code),
    ))
  }
}
