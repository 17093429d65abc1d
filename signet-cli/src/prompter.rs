//! # Terminal Prompts
//!
//! Implements the sign-in [`Prompter`] with dialoguer. Prompts block on the
//! terminal, so each one runs on tokio's blocking pool.

use async_trait::async_trait;
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};
use signet_core::signin::{Prompter, StoreDecision, WelcomeResponse};
use signet_core::{BackendCapability, Credentials};

use crate::output::{format_server_url, format_username, print_success, print_warning};

/// Returns a custom dialoguer theme matching signet's color palette.
///
/// Features:
/// - Cyan bold prompt text
/// - Green `❯` prefix on active item
/// - Green highlight on active item text
pub fn signet_theme() -> ColorfulTheme {
  ColorfulTheme {
    prompt_style: Style::new().cyan().bold(),
    active_item_prefix: Style::new().green().apply_to("❯ ".to_string()),
    active_item_style: Style::new().green(),
    ..ColorfulTheme::default()
  }
}

const STORE_CHOICES: [&str; 3] = ["Yes", "No", "Don't ask again"];
const WELCOME_CHOICES: [&str; 2] = ["OK", "Don't show again"];

/// Map a store prompt selection to a decision.
fn store_decision_for(selection: usize) -> Option<StoreDecision> {
  match selection {
    0 => Some(StoreDecision::Store),
    1 => Some(StoreDecision::DeclineOnce),
    2 => Some(StoreDecision::DeclinePermanently),
    _ => None,
  }
}

/// Run a terminal prompt off the async runtime; errors count as cancelled.
async fn blocking<T, F>(prompt: F) -> Option<T>
where
  F: FnOnce() -> Option<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(prompt).await.ok().flatten()
}

/// Prompts on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

#[async_trait]
impl Prompter for DialoguerPrompter {
  async fn server_url(&self, default: &str) -> Option<String> {
    let default = default.to_string();
    blocking(move || {
      Input::<String>::with_theme(&signet_theme())
        .with_prompt("Build server URL")
        .with_initial_text(default)
        .allow_empty(true)
        .interact_text()
        .ok()
    })
    .await
  }

  async fn username(&self, server_url: &str, default: Option<&str>) -> Option<String> {
    let prompt = format!("Username (URL: {server_url})");
    let default = default.unwrap_or_default().to_string();
    blocking(move || {
      Input::<String>::with_theme(&signet_theme())
        .with_prompt(prompt)
        .with_initial_text(default)
        .allow_empty(true)
        .interact_text()
        .ok()
    })
    .await
  }

  async fn password(&self, username: &str) -> Option<String> {
    let prompt = format!("Password (username: {username})");
    blocking(move || {
      Password::with_theme(&signet_theme())
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .ok()
    })
    .await
  }

  async fn store_decision(&self, capability: BackendCapability) -> Option<StoreDecision> {
    if !capability.secure {
      print_warning(&format!(
        "Credentials would be kept in a {}, protected only by file permissions.",
        capability.kind
      ));
    }

    let prompt = format!("Store credentials in the {}?", capability.kind);
    let selection = blocking(move || {
      Select::with_theme(&signet_theme())
        .with_prompt(prompt)
        .items(STORE_CHOICES)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()
    })
    .await?;

    store_decision_for(selection)
  }

  async fn welcome(&self, credentials: &Credentials) -> WelcomeResponse {
    print_success(&format!(
      "Welcome, {}! You are signed in to {}.",
      format_username(credentials.username()),
      format_server_url(credentials.server_url())
    ));

    let selection = blocking(|| {
      Select::with_theme(&signet_theme())
        .items(WELCOME_CHOICES)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()
    })
    .await;

    match selection {
      Some(1) => WelcomeResponse::DontShowAgain,
      _ => WelcomeResponse::Dismissed,
    }
  }
}
