//! Bounded execution of native credential tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::{BackendError, BackendResult};

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

/// Runs one native tool with a hard deadline.
///
/// Arguments are never logged because they may carry secrets; only the tool
/// and its first argument (the sub-command) appear in traces.
#[derive(Debug, Clone)]
pub struct ToolRunner {
  program: PathBuf,
  timeout: Duration,
}

impl ToolRunner {
  pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
    Self {
      program: program.into(),
      timeout,
    }
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  fn tool_name(&self) -> String {
    self
      .program
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.display().to_string())
  }

  /// Run the tool to completion.
  ///
  /// A non-zero exit is not an error here; callers decide what it means for
  /// their tool. Spawn failures and timeouts are.
  pub async fn run(&self, args: &[&str]) -> BackendResult<ToolOutput> {
    let tool = self.tool_name();
    let op = args.first().copied().unwrap_or_default();
    debug!(tool = %tool, op = %op, "Running credential tool");

    let mut cmd = Command::new(&self.program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let output = match timeout(self.timeout, cmd.output()).await {
      Err(_) => {
        return Err(BackendError::Timeout {
          tool,
          timeout_secs: self.timeout.as_secs(),
        });
      }
      Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
        return Err(BackendError::unavailable(tool, "tool is not installed"));
      }
      Ok(Err(err)) => {
        return Err(BackendError::unavailable(tool, format!("failed to start: {err}")));
      }
      Ok(Ok(output)) => output,
    };

    let result = ToolOutput {
      exit_code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    trace!(tool = %tool, op = %op, exit_code = ?result.exit_code, "Credential tool finished");

    Ok(result)
  }
}

/// Pick the executable for a tool.
///
/// An explicit path wins, then the environment override, then the first
/// candidate that exists, then the bare command name for `PATH` lookup.
pub fn resolve_tool(explicit: Option<&Path>, env_var: &str, candidates: &[PathBuf], fallback: &str) -> PathBuf {
  if let Some(path) = explicit {
    return path.to_path_buf();
  }

  if let Ok(path) = std::env::var(env_var) {
    let trimmed = path.trim();
    if !trimmed.is_empty() {
      return PathBuf::from(trimmed);
    }
  }

  candidates
    .iter()
    .find(|candidate| candidate.exists())
    .cloned()
    .unwrap_or_else(|| PathBuf::from(fallback))
}
