use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use signet_core::signin::{LoginError, RemoteLogin};
use tracing::{debug, warn};
use url::Url;

use crate::consts::{RPC_PATH, USER_AGENT};
use crate::xmlrpc::{self, MethodResponse};

/// Exchanges a username and password for a build server session
pub struct LoginClient {
  pub(crate) client: Client,
  pub(crate) timeout: Duration,
}

impl LoginClient {
  /// Create a new login client whose requests give up after `timeout`
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(timeout)
      .build()
      .context("Failed to create HTTP client")?;

    Ok(Self { client, timeout })
  }

  /// The XML-RPC endpoint of `server_url`
  pub fn endpoint(server_url: &str) -> Result<Url, LoginError> {
    let mut base = Url::parse(server_url.trim())
      .map_err(|err| LoginError::Transport(format!("invalid server URL '{server_url}': {err}")))?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    base
      .join(RPC_PATH)
      .map_err(|err| LoginError::Transport(format!("invalid server URL '{server_url}': {err}")))
  }

  fn transport_error(&self, err: reqwest::Error) -> LoginError {
    if err.is_timeout() {
      LoginError::Timeout {
        timeout_secs: self.timeout.as_secs(),
      }
    } else {
      LoginError::Transport(err.without_url().to_string())
    }
  }
}

#[async_trait]
impl RemoteLogin for LoginClient {
  async fn authenticate(&self, server_url: &str, username: &str, password: &str) -> Result<String, LoginError> {
    let endpoint = Self::endpoint(server_url)?;
    debug!(endpoint = %endpoint, username = %username, "Authenticating");

    let response = self
      .client
      .post(endpoint)
      .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
      .body(xmlrpc::authenticate_call(username, password))
      .send()
      .await
      .map_err(|err| self.transport_error(err))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(LoginError::Unauthorized);
    }
    if !status.is_success() {
      return Err(LoginError::Transport(format!("server answered with HTTP {status}")));
    }

    let body = response.text().await.map_err(|err| self.transport_error(err))?;
    match xmlrpc::parse_response(&body).map_err(LoginError::InvalidResponse)? {
      MethodResponse::Value(token) if !token.is_empty() => Ok(token),
      MethodResponse::Value(_) => Err(LoginError::Unauthorized),
      MethodResponse::Fault { code, message } => {
        warn!(code = ?code, message = %message, "Server refused authentication");
        Err(LoginError::Unauthorized)
      }
    }
  }
}
