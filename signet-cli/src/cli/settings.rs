//! # Settings Command

use anyhow::Result;
use clap::Args;
use signet_core::{Settings, SettingsStore};

use crate::context::AppContext;
use crate::output::{format_path, format_server_url, format_toggle, format_username, print_success};

/// Arguments for the settings command
#[derive(Args)]
pub struct SettingsArgs {
  /// Offer to store credentials after an interactive sign-in
  #[arg(long, value_name = "BOOL")]
  pub ask_store: Option<bool>,

  /// Show a welcome notice after signing in
  #[arg(long, value_name = "BOOL")]
  pub show_welcome: Option<bool>,
}

impl SettingsArgs {
  fn apply(&self, settings: &mut Settings) {
    if let Some(ask) = self.ask_store {
      settings.ask_to_store_credentials = ask;
    }
    if let Some(show) = self.show_welcome {
      settings.show_welcome = show;
    }
  }

  fn changes_anything(&self) -> bool {
    self.ask_store.is_some() || self.show_welcome.is_some()
  }
}

/// Handle the settings command
pub(crate) fn handle_settings_command(ctx: &AppContext, args: SettingsArgs) -> Result<()> {
  let settings = if args.changes_anything() {
    let updated = ctx.settings.update(&mut |settings| args.apply(settings))?;
    print_success("Settings updated.");
    updated
  } else {
    ctx.settings.load()?
  };

  println!("  Ask before storing credentials: {}", format_toggle(settings.ask_to_store_credentials));
  println!("  Show welcome after sign-in:     {}", format_toggle(settings.show_welcome));
  if let Some(url) = &settings.last_server_url {
    println!("  Last server:                    {}", format_server_url(url));
  }
  if let Some(user) = &settings.last_username {
    println!("  Last username:                  {}", format_username(user));
  }
  println!("  Settings file:                  {}", format_path(&ctx.settings.path().display().to_string()));

  Ok(())
}
