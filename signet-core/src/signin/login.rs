//! The remote side of a sign-in.

use async_trait::async_trait;
use thiserror::Error;

/// Why a server did not hand out a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
  /// The server refused the username and password.
  #[error("The server rejected the username or password")]
  Unauthorized,

  /// The server could not be reached or answered with an unexpected status.
  #[error("Could not reach the server: {0}")]
  Transport(String),

  #[error("The server did not answer within {timeout_secs}s")]
  Timeout { timeout_secs: u64 },

  /// The server answered, but not in a form we understand.
  #[error("Unexpected response from the server: {0}")]
  InvalidResponse(String),
}

impl LoginError {
  /// Rejections are the user's to fix; everything else is the connection's.
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized)
  }
}

/// Validates a username and password against a build server.
#[async_trait]
pub trait RemoteLogin: Send + Sync {
  /// Authenticate and return the server's `"sessionId:userId"` token.
  async fn authenticate(&self, server_url: &str, username: &str, password: &str) -> Result<String, LoginError>;
}

/// Split a `"sessionId:userId"` token. Both halves must be non-empty.
pub fn parse_login_token(token: &str) -> Option<(String, String)> {
  let (session_id, user_id) = token.trim().split_once(':')?;
  let (session_id, user_id) = (session_id.trim(), user_id.trim());
  if session_id.is_empty() || user_id.is_empty() {
    return None;
  }
  Some((session_id.to_string(), user_id.to_string()))
}

/// Trim whitespace and one trailing `/` from a server URL.
pub fn normalize_server_url(url: &str) -> String {
  let url = url.trim();
  url.strip_suffix('/').unwrap_or(url).to_string()
}
