//! # Sign-Out and Forget Commands
//!
//! Each CLI invocation is its own process, so there is normally no live
//! session to end; `signout` mostly matters with `--forget`.

use anyhow::Result;
use clap::Args;
use signet_core::BackendError;

use crate::context::AppContext;
use crate::output::{format_command, print_error, print_info, print_success};

/// Arguments for the signout command
#[derive(Args)]
pub struct SignoutArgs {
  /// Also remove stored credentials
  #[arg(long)]
  pub forget: bool,
}

/// What a sign-out did.
#[derive(Debug)]
pub(crate) struct SignOutReport {
  pub had_session: bool,
  /// Result of removing stored credentials, when asked to.
  pub forgotten: Option<Result<(), BackendError>>,
}

/// End the session held by this process and optionally forget stored credentials.
pub(crate) async fn sign_out(ctx: &AppContext, forget: bool) -> SignOutReport {
  let had_session = ctx.cache.is_signed_in().await;
  ctx.cache.clear().await;

  let forgotten = if forget {
    Some(ctx.storage.remove_credentials().await)
  } else {
    None
  };

  SignOutReport { had_session, forgotten }
}

/// Handle the signout command
pub(crate) async fn handle_signout_command(ctx: &AppContext, args: SignoutArgs) -> Result<()> {
  let report = sign_out(ctx, args.forget).await;

  if report.had_session {
    print_success("Signed out.");
  }

  match report.forgotten {
    Some(Ok(())) => print_success(&format!("Removed stored credentials from the {}.", ctx.storage.capability().kind)),
    Some(Err(e)) => print_error(&format!("Could not remove stored credentials: {e}")),
    None => print_info(&format!(
      "No session is active; stored credentials were kept. Use {} to remove them.",
      format_command("signet signout --forget")
    )),
  }
  Ok(())
}

/// Handle the forget command
pub(crate) async fn handle_forget_command(ctx: &AppContext) -> Result<()> {
  handle_signout_command(ctx, SignoutArgs { forget: true }).await
}
