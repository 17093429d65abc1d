//! # Sign-In Command

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use signet_core::signin::{CredentialSource, PersistAction, SignInMode, SignInOutcome};

use crate::context::AppContext;
use crate::output::{format_command, format_server_url, format_username, print_error, print_info, print_success, print_warning};
use crate::prompter::DialoguerPrompter;

/// Arguments for the signin command
#[derive(Args)]
pub struct SigninArgs {
  /// Only use stored credentials and never prompt
  #[arg(long, conflicts_with = "interactive")]
  pub persisted_only: bool,

  /// Ignore stored credentials and always prompt
  #[arg(long)]
  pub interactive: bool,
}

impl SigninArgs {
  pub fn mode(&self) -> SignInMode {
    if self.persisted_only {
      SignInMode::PersistedOnly
    } else if self.interactive {
      SignInMode::InteractiveOnly
    } else {
      SignInMode::Auto
    }
  }
}

/// Exit status for a finished sign-in; anything short of a session is a failure.
pub(crate) fn exit_code_for(outcome: &SignInOutcome) -> ExitCode {
  if outcome.is_authenticated() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  }
}

/// Handle the signin command
pub(crate) async fn handle_signin_command(ctx: &AppContext, args: SigninArgs) -> Result<ExitCode> {
  let flow = ctx.sign_in_flow(Arc::new(DialoguerPrompter))?;
  let outcome = flow.sign_in(args.mode()).await;
  let code = exit_code_for(&outcome);

  match outcome {
    SignInOutcome::Authenticated {
      credentials,
      source,
      persisted,
    } => {
      let via = match source {
        CredentialSource::Persisted => " using stored credentials",
        CredentialSource::Interactive => "",
      };
      print_success(&format!(
        "Signed in to {} as {}{via}.",
        format_server_url(credentials.server_url()),
        format_username(credentials.username())
      ));

      match persisted {
        PersistAction::Stored => print_info(&format!("Credentials stored in the {}.", ctx.storage.capability().kind)),
        PersistAction::StoreFailed => print_warning("Credentials could not be stored; you will be asked again next time."),
        PersistAction::DeclinedPermanently => print_info(&format!(
          "Signet will not offer to store credentials again. Re-enable with {}.",
          format_command("signet settings --ask-store true")
        )),
        PersistAction::Unchanged | PersistAction::Declined | PersistAction::NotAsked => {}
      }
    }
    SignInOutcome::Rejected => print_error("The server rejected the username or password."),
    SignInOutcome::Aborted => print_warning("Sign-in was cancelled."),
    SignInOutcome::NotSignedIn => print_warning(&format!(
      "No usable stored credentials. Run {} to sign in.",
      format_command("signet signin")
    )),
    SignInOutcome::Unreachable { reason } => print_error(&format!("Could not sign in: {reason}")),
  }

  Ok(code)
}
