//! User interaction during sign-in.

use async_trait::async_trait;

use crate::creds::{BackendCapability, Credentials};

/// Answer to "store these credentials?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDecision {
  Store,
  /// Not this time; ask again next time.
  DeclineOnce,
  /// Never ask again and forget anything already stored.
  DeclinePermanently,
}

/// Answer to the welcome notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeResponse {
  Dismissed,
  DontShowAgain,
}

/// Collects input from the user.
///
/// Returning `None` from any of the input methods means the user cancelled.
/// Empty input is treated the same way by the sign-in flow.
#[async_trait]
pub trait Prompter: Send + Sync {
  async fn server_url(&self, default: &str) -> Option<String>;

  async fn username(&self, server_url: &str, default: Option<&str>) -> Option<String>;

  async fn password(&self, username: &str) -> Option<String>;

  /// Ask whether to persist credentials in a store with `capability`.
  /// Dismissing the question counts as declining once.
  async fn store_decision(&self, capability: BackendCapability) -> Option<StoreDecision>;

  async fn welcome(&self, credentials: &Credentials) -> WelcomeResponse;
}
