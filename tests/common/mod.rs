//! Shared helpers for the end-to-end sign-in tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use signet::consts::{ACCOUNT_PASSWORD, ACCOUNT_SERVER_URL, ACCOUNT_USERNAME, SERVICE_NAME};
use signet::settings::MemorySettings;
use signet::{
  BackendCapability, Credentials, LoginClient, PersistentStorageManager, Prompter, SecretBackend,
  SessionCredentialCache, SignInFlow, SignInOptions, StoreDecision, WelcomeResponse,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_RESPONSE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<methodResponse><params><param><value><string>A1B2C3:42</string></value></param></params></methodResponse>";

/// Answers prompts from a script and counts how many were shown
pub struct ScriptedPrompter {
  answers: Mutex<VecDeque<String>>,
  store: Option<StoreDecision>,
  prompts: Mutex<usize>,
}

impl ScriptedPrompter {
  pub fn new(answers: &[&str], store: Option<StoreDecision>) -> Self {
    Self {
      answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
      store,
      prompts: Mutex::new(0),
    }
  }

  pub fn silent() -> Self {
    Self::new(&[], None)
  }

  /// Number of server URL, username and password prompts shown
  pub fn credential_prompts(&self) -> usize {
    *self.prompts.lock().unwrap()
  }

  fn next(&self) -> Option<String> {
    *self.prompts.lock().unwrap() += 1;
    self.answers.lock().unwrap().pop_front()
  }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
  async fn server_url(&self, _default: &str) -> Option<String> {
    self.next()
  }

  async fn username(&self, _server_url: &str, _default: Option<&str>) -> Option<String> {
    self.next()
  }

  async fn password(&self, _username: &str) -> Option<String> {
    self.next()
  }

  async fn store_decision(&self, _capability: BackendCapability) -> Option<StoreDecision> {
    self.store
  }

  async fn welcome(&self, _credentials: &Credentials) -> WelcomeResponse {
    WelcomeResponse::Dismissed
  }
}

/// A sign-in flow wired to the real login client
pub struct Harness {
  pub flow: SignInFlow,
  pub storage: Arc<PersistentStorageManager>,
  pub cache: Arc<SessionCredentialCache>,
  pub prompter: Arc<ScriptedPrompter>,
}

impl Harness {
  pub fn new(backend: Arc<dyn SecretBackend>, prompter: ScriptedPrompter) -> Self {
    let storage = Arc::new(PersistentStorageManager::new(backend));
    let cache = Arc::new(SessionCredentialCache::new());
    let prompter = Arc::new(prompter);
    let login = Arc::new(LoginClient::new(Duration::from_secs(5)).expect("Failed to build login client"));
    let options = SignInOptions {
      remote_timeout: Duration::from_secs(5),
      ..SignInOptions::default()
    };

    let flow = SignInFlow::new(
      storage.clone(),
      cache.clone(),
      login,
      prompter.clone(),
      Arc::new(MemorySettings::default()),
      options,
    );

    Self {
      flow,
      storage,
      cache,
      prompter,
    }
  }
}

/// A server that accepts any credentials
pub async fn accepting_server() -> MockServer {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/RPC2"))
    .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
    .mount(&server)
    .await;
  server
}

/// A server that refuses every sign-in
pub async fn rejecting_server() -> MockServer {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/RPC2"))
    .respond_with(ResponseTemplate::new(401))
    .mount(&server)
    .await;
  server
}

/// Write the three credential entries straight into a backend
pub async fn seed(backend: &dyn SecretBackend, server_url: &str, username: &str, password: &str) {
  for (account, value) in [
    (ACCOUNT_SERVER_URL, server_url),
    (ACCOUNT_USERNAME, username),
    (ACCOUNT_PASSWORD, password),
  ] {
    backend
      .set(SERVICE_NAME, account, value.as_bytes())
      .await
      .expect("Failed to seed backend");
  }
}
