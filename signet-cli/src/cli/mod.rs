//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for the signet tool:
//! signing in and out, forgetting stored credentials, inspecting the current
//! state and changing the sign-in settings.

mod settings;
mod signin;
mod signout;
mod status;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::context::AppContext;
use crate::output::ColorMode;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), " ", env!("TARGET"), ")");

/// Top-level CLI command for the signet tool
#[derive(Parser)]
#[command(name = "signet")]
#[command(display_name = "🔏 Signet")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Sign in to remote build servers and manage stored credentials")]
#[command(
  long_about = "Signet signs you in to a remote build server and, if you allow it, keeps the\n\
        credentials in your platform's secret store so later sign-ins need no typing.\n\n\
        Windows uses the Credential Manager, macOS the login keychain, and other\n\
        systems an owner-only file in your config directory."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightGreen.on_default().bold().underline())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightGreen.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(
    long,
    value_enum,
    ignore_case = true,
    default_value_t = ColorMode::Auto,
  )]
  pub colors: ColorMode,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Subcommands for the signet tool
#[derive(Subcommand)]
pub enum Commands {
  /// Sign in to a build server
  #[command(long_about = "Sign in to a build server.\n\n\
            Stored credentials are tried first and validated against the server without\n\
            any prompt. If there are none, or the server refuses them, you are asked for\n\
            the server URL, username and password. After an interactive sign-in signet\n\
            offers to store the credentials.")]
  #[command(alias = "login")]
  Signin(signin::SigninArgs),

  /// Sign out of the current session
  #[command(long_about = "Sign out of the current session.\n\n\
            Stored credentials are kept unless --forget is given.")]
  #[command(alias = "logout")]
  Signout(signout::SignoutArgs),

  /// Remove stored credentials
  #[command(long_about = "Remove the stored server URL, username and password from the platform\n\
            secret store. Removing credentials that are not stored is not an error.")]
  Forget,

  /// Show the secret store, stored credentials and settings
  #[command(long_about = "Show which secret store signet uses, whether credentials are stored in it,\n\
            and the current sign-in settings. Nothing is sent to the server.")]
  Status,

  /// Show or change sign-in settings
  #[command(long_about = "Show or change the sign-in settings.\n\n\
            Without options the current settings are printed.")]
  Settings(settings::SettingsArgs),
}

/// Run a parsed command line.
///
/// A sign-in that ends without a session exits non-zero so scripts can tell it
/// apart from success.
pub fn handle_cli(cli: Cli) -> Result<ExitCode> {
  // Set global color override based on --colors argument
  match cli.colors {
    ColorMode::Always | ColorMode::Yes => owo_colors::set_override(true),
    ColorMode::Never | ColorMode::No => owo_colors::set_override(false),
    ColorMode::Auto => {
      // Let owo_colors use its default auto-detection
    }
  }

  let ctx = AppContext::load()?;
  let rt = Runtime::new().context("Failed to create async runtime")?;

  match cli.command {
    Commands::Signin(args) => return rt.block_on(signin::handle_signin_command(&ctx, args)),
    Commands::Signout(args) => rt.block_on(signout::handle_signout_command(&ctx, args))?,
    Commands::Forget => rt.block_on(signout::handle_forget_command(&ctx))?,
    Commands::Status => rt.block_on(status::handle_status_command(&ctx))?,
    Commands::Settings(args) => settings::handle_settings_command(&ctx, args)?,
  }
  Ok(ExitCode::SUCCESS)
}
