//! End-to-end sign-in scenarios against a mock build server

mod common;

use std::sync::Arc;

use common::{Harness, ScriptedPrompter, accepting_server, rejecting_server, seed};
use signet::creds::platform::{FileTokenBackend, MemoryBackend};
use signet::{CredentialSource, PersistAction, PersistentStorageManager, SignInMode, SignInOutcome, StoreDecision};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_persisted_credentials_sign_in_without_prompting() {
  let server = accepting_server().await;
  let backend = Arc::new(MemoryBackend::new());
  seed(backend.as_ref(), &server.uri(), "alice", "hunter2").await;

  let harness = Harness::new(backend, ScriptedPrompter::silent());
  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  match outcome {
    SignInOutcome::Authenticated {
      credentials,
      source,
      persisted,
    } => {
      assert_eq!(source, CredentialSource::Persisted);
      assert_eq!(persisted, PersistAction::Unchanged);
      assert_eq!(credentials.username(), "alice");
      assert_eq!(credentials.session_id(), "A1B2C3");
      assert_eq!(credentials.user_id(), "42");
    }
    other => panic!("expected authentication, got {other:?}"),
  }

  assert_eq!(harness.prompter.credential_prompts(), 0);
  assert!(harness.cache.is_signed_in().await);
}

#[tokio::test]
async fn test_interactive_sign_in_stores_credentials_in_token_file() {
  let server = accepting_server().await;
  let temp_dir = TempDir::new().unwrap();
  let token_path = temp_dir.path().join("credentials.json");
  let url = server.uri();

  let prompter = ScriptedPrompter::new(&[&url, "alice", "hunter2"], Some(StoreDecision::Store));
  let harness = Harness::new(Arc::new(FileTokenBackend::new(&token_path)), prompter);
  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  match &outcome {
    SignInOutcome::Authenticated { source, persisted, .. } => {
      assert_eq!(*source, CredentialSource::Interactive);
      assert_eq!(*persisted, PersistAction::Stored);
    }
    other => panic!("expected authentication, got {other:?}"),
  }
  assert_eq!(harness.prompter.credential_prompts(), 3);

  // A fresh manager over the same file sees what was stored
  let reopened = PersistentStorageManager::new(Arc::new(FileTokenBackend::new(&token_path)));
  let stored = reopened.get_credentials().await.expect("credentials should be stored");
  assert_eq!(stored.server_url, url);
  assert_eq!(stored.username, "alice");
  assert_eq!(stored.password, "hunter2");

  let raw = std::fs::read_to_string(&token_path).unwrap();
  assert!(!raw.contains("hunter2"), "token file must not hold the password in clear text");

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(&token_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
  }
}

#[tokio::test]
async fn test_rejected_password_leaves_nothing_behind() {
  let server = rejecting_server().await;
  let backend = Arc::new(MemoryBackend::new());
  let url = server.uri();

  let prompter = ScriptedPrompter::new(&[&url, "alice", "wrong"], Some(StoreDecision::Store));
  let harness = Harness::new(backend.clone(), prompter);
  let outcome = harness.flow.sign_in(SignInMode::InteractiveOnly).await;

  assert!(matches!(outcome, SignInOutcome::Rejected), "got {outcome:?}");
  assert!(!harness.cache.is_signed_in().await);
  assert!(backend.is_empty().await);
  assert!(harness.storage.get_credentials().await.is_none());
}

#[tokio::test]
async fn test_stale_persisted_password_falls_through_to_prompting() {
  let server = accepting_server().await;
  Mock::given(method("POST"))
    .and(body_string_contains("<string>stale</string>"))
    .respond_with(ResponseTemplate::new(401))
    .with_priority(1)
    .mount(&server)
    .await;

  let backend = Arc::new(MemoryBackend::new());
  seed(backend.as_ref(), &server.uri(), "alice", "stale").await;
  let url = server.uri();

  let prompter = ScriptedPrompter::new(&[&url, "alice", "hunter2"], Some(StoreDecision::Store));
  let harness = Harness::new(backend, prompter);
  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  match outcome {
    SignInOutcome::Authenticated { source, persisted, .. } => {
      assert_eq!(source, CredentialSource::Interactive);
      assert_eq!(persisted, PersistAction::Stored);
    }
    other => panic!("expected authentication, got {other:?}"),
  }
  assert_eq!(harness.prompter.credential_prompts(), 3);

  let stored = harness.storage.get_credentials().await.expect("credentials should be stored");
  assert_eq!(stored.password, "hunter2");
}

#[tokio::test]
async fn test_incomplete_persisted_credentials_fall_through_to_prompting() {
  let server = accepting_server().await;
  let backend = Arc::new(MemoryBackend::new());
  seed(backend.as_ref(), &server.uri(), "alice", "").await;
  let url = server.uri();

  let prompter = ScriptedPrompter::new(&[&url, "alice", "hunter2"], Some(StoreDecision::DeclineOnce));
  let harness = Harness::new(backend, prompter);
  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  assert!(outcome.is_authenticated(), "got {outcome:?}");
  assert_eq!(harness.prompter.credential_prompts(), 3);
}

#[tokio::test]
async fn test_persisted_only_without_credentials_does_not_prompt() {
  let harness = Harness::new(Arc::new(MemoryBackend::new()), ScriptedPrompter::silent());
  let outcome = harness.flow.sign_in(SignInMode::PersistedOnly).await;

  assert!(matches!(outcome, SignInOutcome::NotSignedIn), "got {outcome:?}");
  assert_eq!(harness.prompter.credential_prompts(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_keychain_tool_falls_through_to_prompting() {
  use std::time::Duration;

  use signet::creds::platform::KeychainBackend;
  use signet_test_utils::FakeToolGuard;

  let server = accepting_server().await;
  let tool = FakeToolGuard::new("security", "security: SecKeychainSearchCopyNext: failure\n", 1);
  let backend = Arc::new(KeychainBackend::new(tool.path(), Duration::from_secs(5)));
  let url = server.uri();

  let prompter = ScriptedPrompter::new(&[&url, "alice", "hunter2"], Some(StoreDecision::DeclineOnce));
  let harness = Harness::new(backend, prompter);
  let outcome = harness.flow.sign_in(SignInMode::Auto).await;

  match outcome {
    SignInOutcome::Authenticated { source, .. } => assert_eq!(source, CredentialSource::Interactive),
    other => panic!("expected authentication, got {other:?}"),
  }
  assert_eq!(harness.prompter.credential_prompts(), 3);
}
