//! # Status Command
//!
//! Reports the active secret store, whether credentials are stored in it and
//! the sign-in settings, without contacting the server.

use anyhow::Result;
use signet_core::SettingsStore;
use signet_core::creds::BackendKind;
use signet_core::creds::platform::{FilePermissions, PlatformFilePermissions};

use crate::context::AppContext;
use crate::output::{
  format_command, format_path, format_server_url, format_toggle, format_username, print_header, print_info,
  print_success, print_warning,
};

/// Handle the status command
pub(crate) async fn handle_status_command(ctx: &AppContext) -> Result<()> {
  let capability = ctx.storage.capability();

  print_header("Secret store");
  println!("  Backend: {}", capability.kind);
  if capability.secure {
    print_success("Secrets are protected by the operating system.");
  } else {
    print_warning("Secrets are protected by file permissions only.");
  }

  if capability.kind == BackendKind::LinuxFile {
    check_token_file(ctx);
  }

  print_header("Stored credentials");
  match ctx.storage.get_credentials().await {
    Some(stored) => {
      println!("  Server:   {}", format_server_url(&stored.server_url));
      println!("  Username: {}", format_username(&stored.username));
    }
    None => print_info(&format!(
      "No credentials stored. Run {} to sign in.",
      format_command("signet signin")
    )),
  }

  print_header("Settings");
  match ctx.settings.load() {
    Ok(settings) => {
      println!("  Ask before storing credentials: {}", format_toggle(settings.ask_to_store_credentials));
      println!("  Show welcome after sign-in:     {}", format_toggle(settings.show_welcome));
    }
    Err(e) => print_warning(&format!("Could not read settings: {e}")),
  }

  Ok(())
}

fn check_token_file(ctx: &AppContext) {
  let path = ctx.dirs.token_path();
  if !path.exists() {
    return;
  }

  match PlatformFilePermissions::has_secure_permissions(&path) {
    Ok(true) => println!("  Token file: {}", format_path(&path.display().to_string())),
    Ok(false) => {
      print_warning("Your token file has insecure permissions.");
      println!(
        "For security, change permissions to 600: {}",
        format_command(&format!("chmod 600 {}", path.display()))
      );
    }
    Err(e) => print_warning(&format!("Could not check token file permissions: {e}")),
  }
}
