use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use signet_test_utils::LogCapture;

use super::*;
use crate::creds::platform::MemoryBackend;
use crate::creds::{BackendCapability, BackendError, BackendKind, BackendResult, SecretBackend, SecretRecord};
use crate::settings::MemorySettings;

const URL: &str = "https://ci.example.com";

/// Accepts one password, rejects everything else.
struct FakeLogin {
  password: String,
  failure: Option<LoginError>,
  delay: Option<Duration>,
  calls: Mutex<Vec<(String, String)>>,
}

impl FakeLogin {
  fn accepting(password: &str) -> Self {
    Self {
      password: password.to_string(),
      failure: None,
      delay: None,
      calls: Mutex::new(Vec::new()),
    }
  }

  fn failing(err: LoginError) -> Self {
    Self {
      failure: Some(err),
      ..Self::accepting("")
    }
  }

  fn slow(delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::accepting("pw")
    }
  }

  fn calls(&self) -> Vec<(String, String)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl RemoteLogin for FakeLogin {
  async fn authenticate(&self, server_url: &str, username: &str, password: &str) -> Result<String, LoginError> {
    self.calls.lock().unwrap().push((server_url.to_string(), username.to_string()));
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if let Some(err) = &self.failure {
      return Err(err.clone());
    }
    if password == self.password {
      Ok("SESSION42:7".to_string())
    } else {
      Err(LoginError::Unauthorized)
    }
  }
}

/// Answers prompts from a script and records what was asked.
struct ScriptedPrompter {
  answers: Mutex<VecDeque<Option<String>>>,
  store: Option<StoreDecision>,
  welcome: WelcomeResponse,
  asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
  fn new(answers: &[Option<&str>]) -> Self {
    Self {
      answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
      store: Some(StoreDecision::Store),
      welcome: WelcomeResponse::Dismissed,
      asked: Mutex::new(Vec::new()),
    }
  }

  fn typing(url: &str, user: &str, pass: &str) -> Self {
    Self::new(&[Some(url), Some(user), Some(pass)])
  }

  fn silent() -> Self {
    Self::new(&[])
  }

  fn with_store(mut self, decision: Option<StoreDecision>) -> Self {
    self.store = decision;
    self
  }

  fn with_welcome(mut self, response: WelcomeResponse) -> Self {
    self.welcome = response;
    self
  }

  fn asked(&self) -> Vec<String> {
    self.asked.lock().unwrap().clone()
  }

  fn next(&self, question: String) -> Option<String> {
    self.asked.lock().unwrap().push(question);
    self.answers.lock().unwrap().pop_front().flatten()
  }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
  async fn server_url(&self, default: &str) -> Option<String> {
    self.next(format!("url[{default}]"))
  }

  async fn username(&self, _server_url: &str, default: Option<&str>) -> Option<String> {
    self.next(format!("user[{}]", default.unwrap_or_default()))
  }

  async fn password(&self, _username: &str) -> Option<String> {
    self.next("password".to_string())
  }

  async fn store_decision(&self, _capability: BackendCapability) -> Option<StoreDecision> {
    self.asked.lock().unwrap().push("store".to_string());
    self.store
  }

  async fn welcome(&self, _credentials: &Credentials) -> WelcomeResponse {
    self.asked.lock().unwrap().push("welcome".to_string());
    self.welcome
  }
}

/// Reads work, writes fail.
struct ReadOnlyBackend;

#[async_trait]
impl SecretBackend for ReadOnlyBackend {
  fn capability(&self) -> BackendCapability {
    BackendCapability::of(BackendKind::Windows)
  }

  async fn get(&self, _service: &str, _account: &str) -> BackendResult<Option<SecretRecord>> {
    Ok(None)
  }

  async fn set(&self, _service: &str, _account: &str, _secret: &[u8]) -> BackendResult<()> {
    Err(BackendError::unavailable("creds.exe", "exit code 1"))
  }

  async fn delete(&self, _service: &str, _account: &str) -> BackendResult<()> {
    Ok(())
  }
}

struct Harness {
  storage: Arc<PersistentStorageManager>,
  cache: Arc<SessionCredentialCache>,
  login: Arc<FakeLogin>,
  prompter: Arc<ScriptedPrompter>,
  settings: Arc<MemorySettings>,
  flow: SignInFlow,
}

impl Harness {
  fn new(login: FakeLogin, prompter: ScriptedPrompter) -> Self {
    Self::with(Arc::new(MemoryBackend::new()), login, prompter, Settings::default(), SignInOptions::default())
  }

  fn with(
    backend: Arc<dyn SecretBackend>,
    login: FakeLogin,
    prompter: ScriptedPrompter,
    settings: Settings,
    options: SignInOptions,
  ) -> Self {
    let storage = Arc::new(PersistentStorageManager::new(backend));
    let cache = Arc::new(SessionCredentialCache::new());
    let login = Arc::new(login);
    let prompter = Arc::new(prompter);
    let settings = Arc::new(MemorySettings::new(settings));
    let flow = SignInFlow::new(
      storage.clone(),
      cache.clone(),
      login.clone(),
      prompter.clone(),
      settings.clone(),
      options,
    );

    Self {
      storage,
      cache,
      login,
      prompter,
      settings,
      flow,
    }
  }

  async fn persist(&self, url: &str, user: &str, pass: &str) {
    let credentials = Credentials::authenticated(StoredCredentials::new(url, user, pass), "s".into(), "1".into());
    self.storage.set_credentials(&credentials).await.unwrap();
  }
}

#[tokio::test]
async fn test_persisted_credentials_sign_in_without_prompts() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::silent());
  harness.persist(URL, "alice", "pw").await;

  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  match outcome {
    SignInOutcome::Authenticated {
      credentials,
      source,
      persisted,
    } => {
      assert_eq!(source, CredentialSource::Persisted);
      assert_eq!(persisted, PersistAction::Unchanged);
      assert_eq!(credentials.session_id(), "SESSION42");
      assert_eq!(credentials.user_id(), "7");
    }
    other => panic!("expected success, got {other:?}"),
  }
  // Only the welcome notice, no input prompts.
  assert_eq!(harness.prompter.asked(), vec!["welcome"]);
  assert!(harness.cache.is_signed_in().await);
}

#[tokio::test]
async fn test_interactive_sign_in_and_store() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::typing(URL, "alice", "pw"));

  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  assert!(outcome.is_authenticated());
  assert_eq!(
    harness.prompter.asked(),
    vec!["url[http://localhost:8111]", "user[]", "password", "store", "welcome"]
  );
  let stored = harness.storage.get_credentials().await.unwrap();
  assert_eq!(stored, StoredCredentials::new(URL, "alice", "pw"));
  assert_eq!(harness.cache.get().await.unwrap().username(), "alice");
}

#[tokio::test]
async fn test_rejected_credentials_are_neither_cached_nor_stored() {
  let logs = LogCapture::start();
  let harness = Harness::new(FakeLogin::accepting("right"), ScriptedPrompter::typing(URL, "alice", "wrong"));

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(outcome, SignInOutcome::Rejected));
  assert!(!harness.cache.is_signed_in().await);
  assert!(harness.storage.get_credentials().await.is_none());
  assert!(!harness.prompter.asked().contains(&"store".to_string()));
  assert!(logs.contains("WARN"));
  assert!(logs.contains("Server rejected the credentials"));
  assert!(!logs.contains("wrong"));
}

#[tokio::test]
async fn test_rejected_persisted_credentials_fall_through_to_prompt() {
  let harness = Harness::new(FakeLogin::accepting("new-pw"), ScriptedPrompter::typing(URL, "alice", "new-pw"));
  harness.persist("https://old.example.com", "alice", "old-pw").await;

  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  assert!(outcome.is_authenticated());
  assert_eq!(harness.prompter.asked()[0], "url[https://old.example.com]");
  assert_eq!(harness.login.calls().len(), 2);
  assert_eq!(harness.storage.get_credentials().await.unwrap().password, "new-pw");
}

#[tokio::test]
async fn test_persisted_only_never_prompts() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::silent());

  let outcome = harness.flow.sign_in(SignInMode::PersistedOnly).await;

  assert!(matches!(outcome, SignInOutcome::NotSignedIn));
  assert!(harness.prompter.asked().is_empty());
  assert!(harness.login.calls().is_empty());
}

#[tokio::test]
async fn test_empty_username_aborts() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::typing(URL, "", "pw"));

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(outcome, SignInOutcome::Aborted));
  assert!(harness.login.calls().is_empty());
  assert!(!harness.cache.is_signed_in().await);
}

#[tokio::test]
async fn test_cancelled_password_aborts() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::new(&[Some(URL), Some("alice"), None]),
  );

  assert!(matches!(
    harness.flow.sign_in(SignInMode::InteractiveOnly).await,
    SignInOutcome::Aborted
  ));
  assert!(harness.login.calls().is_empty());
}

#[tokio::test]
async fn test_trailing_slash_is_removed() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing("https://ci.example.com/", "alice", "pw"),
  );

  harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert_eq!(harness.login.calls(), vec![(URL.to_string(), "alice".to_string())]);
  assert_eq!(harness.cache.get().await.unwrap().server_url(), URL);
}

#[tokio::test]
async fn test_decline_once_leaves_storage_alone() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "bob", "pw").with_store(Some(StoreDecision::DeclineOnce)),
  );
  harness.persist(URL, "alice", "old").await;

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(
    outcome,
    SignInOutcome::Authenticated {
      persisted: PersistAction::Declined,
      ..
    }
  ));
  assert_eq!(harness.storage.get_credentials().await.unwrap().username, "alice");
  assert!(harness.settings.load().unwrap().ask_to_store_credentials);
}

#[tokio::test]
async fn test_dismissed_store_question_counts_as_decline_once() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "bob", "pw").with_store(None),
  );

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(
    outcome,
    SignInOutcome::Authenticated {
      persisted: PersistAction::Declined,
      ..
    }
  ));
  assert!(harness.storage.get_credentials().await.is_none());
}

#[tokio::test]
async fn test_decline_permanently_turns_off_asking_and_forgets() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "bob", "pw").with_store(Some(StoreDecision::DeclinePermanently)),
  );
  harness.persist(URL, "alice", "old").await;

  harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(harness.storage.get_credentials().await.is_none());
  assert!(!harness.settings.load().unwrap().ask_to_store_credentials);
  assert!(harness.cache.is_signed_in().await);
}

#[tokio::test]
async fn test_no_question_when_asking_is_off() {
  let settings = Settings {
    ask_to_store_credentials: false,
    ..Settings::default()
  };
  let harness = Harness::with(
    Arc::new(MemoryBackend::new()),
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "alice", "pw"),
    settings,
    SignInOptions::default(),
  );

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(
    outcome,
    SignInOutcome::Authenticated {
      persisted: PersistAction::NotAsked,
      ..
    }
  ));
  assert!(!harness.prompter.asked().contains(&"store".to_string()));
  assert!(harness.storage.get_credentials().await.is_none());
}

#[tokio::test]
async fn test_store_failure_does_not_fail_sign_in() {
  let logs = LogCapture::start();
  let harness = Harness::with(
    Arc::new(ReadOnlyBackend),
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "alice", "pw"),
    Settings::default(),
    SignInOptions::default(),
  );

  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  assert!(matches!(
    outcome,
    SignInOutcome::Authenticated {
      persisted: PersistAction::StoreFailed,
      ..
    }
  ));
  assert!(harness.cache.is_signed_in().await);
  assert!(logs.contains("Storing credentials is not supported here"));
}

#[tokio::test]
async fn test_dont_show_welcome_again() {
  let harness = Harness::new(
    FakeLogin::accepting("pw"),
    ScriptedPrompter::typing(URL, "alice", "pw").with_welcome(WelcomeResponse::DontShowAgain),
  );

  harness.flow.sign_in(SignInMode::InteractiveOnly).await;
  assert!(!harness.settings.load().unwrap().show_welcome);
}

#[tokio::test]
async fn test_last_used_values_are_remembered() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::typing(URL, "alice", "pw"));

  harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  let settings = harness.settings.load().unwrap();
  assert_eq!(settings.last_server_url.as_deref(), Some(URL));
  assert_eq!(settings.last_username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_reprompt_after_rejection_prefills_previous_answers() {
  let options = SignInOptions {
    max_interactive_attempts: 2,
    ..SignInOptions::default()
  };
  let harness = Harness::with(
    Arc::new(MemoryBackend::new()),
    FakeLogin::accepting("right"),
    ScriptedPrompter::new(&[
      Some(URL),
      Some("alice"),
      Some("wrong"),
      Some(URL),
      Some("alice"),
      Some("right"),
    ]),
    Settings::default(),
    options,
  );

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(outcome.is_authenticated());
  let asked = harness.prompter.asked();
  assert_eq!(asked[3], format!("url[{URL}]"));
  assert_eq!(asked[4], "user[alice]");
}

#[tokio::test]
async fn test_transport_failure_is_unreachable() {
  let harness = Harness::new(
    FakeLogin::failing(LoginError::Transport("connection refused".into())),
    ScriptedPrompter::typing(URL, "alice", "pw"),
  );

  match harness.flow.sign_in(SignInMode::InteractiveOnly).await {
    SignInOutcome::Unreachable { reason } => assert!(reason.contains("connection refused")),
    other => panic!("expected unreachable, got {other:?}"),
  }
  assert!(!harness.cache.is_signed_in().await);
}

#[tokio::test]
async fn test_slow_server_times_out() {
  let options = SignInOptions {
    remote_timeout: Duration::from_millis(50),
    ..SignInOptions::default()
  };
  let harness = Harness::with(
    Arc::new(MemoryBackend::new()),
    FakeLogin::slow(Duration::from_secs(5)),
    ScriptedPrompter::typing(URL, "alice", "pw"),
    Settings::default(),
    options,
  );

  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;
  assert!(matches!(outcome, SignInOutcome::Unreachable { .. }));
}

#[tokio::test]
async fn test_sign_out_with_forget() {
  let harness = Harness::new(FakeLogin::accepting("pw"), ScriptedPrompter::silent());
  harness.persist(URL, "alice", "pw").await;
  assert!(harness.flow.sign_in(SignInMode::PersistedOnly).await.is_authenticated());

  harness.flow.sign_out(false).await;
  assert!(!harness.cache.is_signed_in().await);
  assert!(harness.storage.get_credentials().await.is_some());

  harness.flow.sign_out(true).await;
  assert!(harness.storage.get_credentials().await.is_none());
}

#[test]
fn test_modes_expand_to_attempts() {
  assert_eq!(SignInMode::Auto.attempts(), &[Attempt::Persisted, Attempt::Interactive]);
  assert_eq!(SignInMode::PersistedOnly.attempts(), &[Attempt::Persisted]);
  assert_eq!(SignInMode::InteractiveOnly.attempts(), &[Attempt::Interactive]);
}

#[test]
fn test_options_normalize_default_url() {
  let mut config = SignetConfig::default();
  config.signin.default_server_url = "https://ci.example.com/".to_string();
  config.signin.max_interactive_attempts = 0;

  let options = SignInOptions::from_config(&config);
  assert_eq!(options.default_server_url, URL);
  assert_eq!(options.max_interactive_attempts, 1);
}
