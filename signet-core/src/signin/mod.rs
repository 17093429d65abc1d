//! # Sign-In
//!
//! Sequences the sign-in: replay of persisted credentials, interactive
//! prompting, remote validation and the decision whether to store the result.
//!
//! A [`SignInMode`] expands into an ordered list of [`Attempt`]s. Each attempt
//! yields a tagged [`AttemptResult`], and a single control loop in
//! [`SignInFlow::sign_in`] decides whether to finish or fall through to the
//! next attempt.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::SignetConfig;
use crate::consts::DEFAULT_SERVER_URL;
use crate::creds::{Credentials, PersistentStorageManager, StoredCredentials};
use crate::session::SessionCredentialCache;
use crate::settings::{Settings, SettingsStore};

pub mod login;
pub mod prompt;

pub use login::{LoginError, RemoteLogin, normalize_server_url, parse_login_token};
pub use prompt::{Prompter, StoreDecision, WelcomeResponse};

/// Which sources a sign-in may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignInMode {
  /// Persisted credentials first, then ask the user.
  #[default]
  Auto,
  /// Persisted credentials only, without any prompt.
  PersistedOnly,
  /// Always ask the user.
  InteractiveOnly,
}

impl SignInMode {
  pub fn attempts(self) -> &'static [Attempt] {
    match self {
      Self::Auto => &[Attempt::Persisted, Attempt::Interactive],
      Self::PersistedOnly => &[Attempt::Persisted],
      Self::InteractiveOnly => &[Attempt::Interactive],
    }
  }
}

/// One way of obtaining credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
  Persisted,
  Interactive,
}

/// Where the credentials of a successful sign-in came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
  Persisted,
  Interactive,
}

impl From<Attempt> for CredentialSource {
  fn from(attempt: Attempt) -> Self {
    match attempt {
      Attempt::Persisted => Self::Persisted,
      Attempt::Interactive => Self::Interactive,
    }
  }
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptResult {
  Authenticated(Credentials),
  NotFound,
  Rejected,
  Aborted,
  Failed(String),
}

/// Steps of the sign-in, as they appear in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInState {
  Idle,
  TryPersisted,
  PromptInteractive,
  Authenticated,
  Rejected,
  Aborted,
  StoreDecision,
  Done,
}

impl fmt::Display for SignInState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Idle => "idle",
      Self::TryPersisted => "try-persisted",
      Self::PromptInteractive => "prompt-interactive",
      Self::Authenticated => "authenticated",
      Self::Rejected => "rejected",
      Self::Aborted => "aborted",
      Self::StoreDecision => "store-decision",
      Self::Done => "done",
    };
    f.write_str(name)
  }
}

/// What happened to the credentials after an interactive sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistAction {
  /// They came from storage; storage was left alone.
  Unchanged,
  Stored,
  /// Storing was attempted and failed; the sign-in still succeeded.
  StoreFailed,
  /// The user asked not to store them this time.
  Declined,
  /// The user turned storing off and persisted credentials were removed.
  DeclinedPermanently,
  /// Asking is turned off, so nothing was stored.
  NotAsked,
}

/// Final result of a sign-in.
#[derive(Debug)]
pub enum SignInOutcome {
  Authenticated {
    credentials: Credentials,
    source: CredentialSource,
    persisted: PersistAction,
  },
  /// The server refused the credentials the user typed.
  Rejected,
  /// The user cancelled a prompt.
  Aborted,
  /// Nothing usable was stored and prompting was not allowed.
  NotSignedIn,
  /// The server could not be reached or did not answer in time.
  Unreachable { reason: String },
}

impl SignInOutcome {
  pub fn is_authenticated(&self) -> bool {
    matches!(self, Self::Authenticated { .. })
  }

  pub fn credentials(&self) -> Option<&Credentials> {
    match self {
      Self::Authenticated { credentials, .. } => Some(credentials),
      _ => None,
    }
  }
}

/// Tunables of the sign-in flow.
#[derive(Debug, Clone)]
pub struct SignInOptions {
  pub remote_timeout: Duration,
  pub default_server_url: String,
  pub max_interactive_attempts: u32,
}

impl Default for SignInOptions {
  fn default() -> Self {
    Self::from_config(&SignetConfig::default())
  }
}

impl SignInOptions {
  pub fn from_config(config: &SignetConfig) -> Self {
    let default_server_url = if config.signin.default_server_url.trim().is_empty() {
      DEFAULT_SERVER_URL.to_string()
    } else {
      normalize_server_url(&config.signin.default_server_url)
    };

    Self {
      remote_timeout: config.timeouts.remote_validation(),
      default_server_url,
      max_interactive_attempts: config.signin.max_interactive_attempts.max(1),
    }
  }
}

/// Everything the attempts learn along the way.
#[derive(Default)]
struct FlowContext {
  persisted: Option<StoredCredentials>,
}

/// The sign-in state machine and its collaborators.
pub struct SignInFlow {
  storage: Arc<PersistentStorageManager>,
  cache: Arc<SessionCredentialCache>,
  login: Arc<dyn RemoteLogin>,
  prompter: Arc<dyn Prompter>,
  settings: Arc<dyn SettingsStore>,
  options: SignInOptions,
}

impl SignInFlow {
  pub fn new(
    storage: Arc<PersistentStorageManager>,
    cache: Arc<SessionCredentialCache>,
    login: Arc<dyn RemoteLogin>,
    prompter: Arc<dyn Prompter>,
    settings: Arc<dyn SettingsStore>,
    options: SignInOptions,
  ) -> Self {
    Self {
      storage,
      cache,
      login,
      prompter,
      settings,
      options,
    }
  }

  pub fn options(&self) -> &SignInOptions {
    &self.options
  }

  fn enter(&self, state: SignInState) {
    debug!(state = %state, "Sign-in state");
  }

  /// Run the sign-in. Never fails; every way it can end is an outcome.
  pub async fn sign_in(&self, mode: SignInMode) -> SignInOutcome {
    self.enter(SignInState::Idle);
    info!(mode = ?mode, "Signing in");

    let mut ctx = FlowContext::default();
    for &attempt in mode.attempts() {
      let result = match attempt {
        Attempt::Persisted => self.try_persisted(&mut ctx).await,
        Attempt::Interactive => self.prompt_interactive(&ctx).await,
      };

      match (attempt, result) {
        (_, AttemptResult::Authenticated(credentials)) => {
          return self.finish(credentials, attempt.into()).await;
        }
        // Nothing from storage is final; the next attempt gets its turn.
        (Attempt::Persisted, AttemptResult::NotFound) => {
          debug!("No usable persisted credentials");
        }
        (Attempt::Persisted, result) => {
          debug!(result = ?result, "Persisted credentials did not sign in");
        }
        (Attempt::Interactive, AttemptResult::Rejected) => {
          self.enter(SignInState::Rejected);
          return SignInOutcome::Rejected;
        }
        (Attempt::Interactive, AttemptResult::Aborted | AttemptResult::NotFound) => {
          self.enter(SignInState::Aborted);
          info!("Sign-in was aborted by the user");
          return SignInOutcome::Aborted;
        }
        (Attempt::Interactive, AttemptResult::Failed(reason)) => {
          warn!(reason = %reason, "Sign-in failed");
          return SignInOutcome::Unreachable { reason };
        }
      }
    }

    self.enter(SignInState::Done);
    SignInOutcome::NotSignedIn
  }

  /// Clear the session and, with `forget`, the persisted credentials.
  pub async fn sign_out(&self, forget: bool) {
    self.cache.clear().await;
    if forget && let Err(err) = self.storage.remove_credentials().await {
      warn!(error = %err, "Could not remove persisted credentials");
    }
    info!(forget, "Signed out");
  }

  async fn try_persisted(&self, ctx: &mut FlowContext) -> AttemptResult {
    self.enter(SignInState::TryPersisted);

    let Some(stored) = self.storage.get_credentials().await else {
      return AttemptResult::NotFound;
    };
    if !stored.is_complete() {
      return AttemptResult::NotFound;
    }
    ctx.persisted = Some(stored.clone());

    match self.validate(stored).await {
      Ok(credentials) => AttemptResult::Authenticated(credentials),
      Err(LoginError::Unauthorized) => {
        warn!("Persisted credentials were rejected by the server");
        AttemptResult::Rejected
      }
      Err(err) => {
        warn!(error = %err, "Could not validate persisted credentials");
        AttemptResult::Failed(err.to_string())
      }
    }
  }

  async fn prompt_interactive(&self, ctx: &FlowContext) -> AttemptResult {
    self.enter(SignInState::PromptInteractive);

    let settings = self.load_settings();
    let mut default_url = settings
      .last_server_url
      .or_else(|| ctx.persisted.as_ref().map(|stored| stored.server_url.clone()))
      .unwrap_or_else(|| self.options.default_server_url.clone());
    let mut default_username = settings.last_username;

    let max_attempts = self.options.max_interactive_attempts.max(1);
    for round in 1..=max_attempts {
      let Some(server_url) = self.prompter.server_url(&default_url).await.map(|url| normalize_server_url(&url)) else {
        return AttemptResult::Aborted;
      };
      if server_url.is_empty() {
        return AttemptResult::Aborted;
      }

      let Some(username) = self
        .prompter
        .username(&server_url, default_username.as_deref())
        .await
        .map(|name| name.trim().to_string())
      else {
        return AttemptResult::Aborted;
      };
      if username.is_empty() {
        return AttemptResult::Aborted;
      }

      let password = match self.prompter.password(&username).await {
        Some(password) if !password.is_empty() => password,
        _ => return AttemptResult::Aborted,
      };

      match self.validate(StoredCredentials::new(&server_url, &username, password)).await {
        Ok(credentials) => return AttemptResult::Authenticated(credentials),
        Err(LoginError::Unauthorized) => {
          warn!(server_url = %server_url, username = %username, round, "Server rejected the credentials");
          default_url = server_url;
          default_username = Some(username);
        }
        Err(err) => return AttemptResult::Failed(err.to_string()),
      }

      if round < max_attempts {
        debug!(round, max_attempts, "Asking again");
      }
    }

    AttemptResult::Rejected
  }

  /// Authenticate the exact triple, bounded by the remote timeout.
  async fn validate(&self, login: StoredCredentials) -> Result<Credentials, LoginError> {
    let call = self.login.authenticate(&login.server_url, &login.username, &login.password);
    let token = match timeout(self.options.remote_timeout, call).await {
      Ok(result) => result?,
      Err(_) => {
        return Err(LoginError::Timeout {
          timeout_secs: self.options.remote_timeout.as_secs(),
        });
      }
    };

    // A token we cannot read is no session.
    let Some((session_id, user_id)) = parse_login_token(&token) else {
      debug!("Server answered without a usable session token");
      return Err(LoginError::Unauthorized);
    };

    Ok(Credentials::authenticated(login, session_id, user_id))
  }

  async fn finish(&self, credentials: Credentials, source: CredentialSource) -> SignInOutcome {
    self.enter(SignInState::Authenticated);
    info!(
      server_url = %credentials.server_url(),
      username = %credentials.username(),
      source = ?source,
      "Signed in"
    );

    self.cache.set(credentials.clone()).await;
    self.remember_last_used(&credentials);

    let persisted = match source {
      CredentialSource::Persisted => PersistAction::Unchanged,
      CredentialSource::Interactive => self.offer_to_store(&credentials).await,
    };

    self.greet(&credentials).await;
    self.enter(SignInState::Done);

    SignInOutcome::Authenticated {
      credentials,
      source,
      persisted,
    }
  }

  async fn offer_to_store(&self, credentials: &Credentials) -> PersistAction {
    if !self.load_settings().ask_to_store_credentials {
      debug!("Not asking to store credentials");
      return PersistAction::NotAsked;
    }

    self.enter(SignInState::StoreDecision);
    let decision = self
      .prompter
      .store_decision(self.storage.capability())
      .await
      .unwrap_or(StoreDecision::DeclineOnce);

    match decision {
      StoreDecision::Store => match self.storage.set_credentials(credentials).await {
        Ok(()) => PersistAction::Stored,
        Err(err) => {
          warn!(error = %err, "Storing credentials is not supported here");
          PersistAction::StoreFailed
        }
      },
      StoreDecision::DeclineOnce => {
        debug!("User declined to store credentials");
        PersistAction::Declined
      }
      StoreDecision::DeclinePermanently => {
        self.update_settings(|settings| settings.ask_to_store_credentials = false);
        if let Err(err) = self.storage.remove_credentials().await {
          warn!(error = %err, "Could not remove persisted credentials");
        }
        info!("Credentials will not be stored");
        PersistAction::DeclinedPermanently
      }
    }
  }

  async fn greet(&self, credentials: &Credentials) {
    if !self.load_settings().show_welcome {
      return;
    }

    if self.prompter.welcome(credentials).await == WelcomeResponse::DontShowAgain {
      self.update_settings(|settings| settings.show_welcome = false);
    }
  }

  fn remember_last_used(&self, credentials: &Credentials) {
    let server_url = credentials.server_url().to_string();
    let username = credentials.username().to_string();
    self.update_settings(move |settings| {
      settings.last_server_url = Some(server_url.clone());
      settings.last_username = Some(username.clone());
    });
  }

  fn load_settings(&self) -> Settings {
    self.settings.load().unwrap_or_else(|err| {
      warn!(error = %err, "Could not load settings, using defaults");
      Settings::default()
    })
  }

  fn update_settings(&self, mut change: impl FnMut(&mut Settings)) {
    if let Err(err) = self.settings.update(&mut change) {
      warn!(error = %err, "Could not save settings");
    }
  }
}

#[cfg(test)]
mod tests;
