//! # Signet CLI
//!
//! Command line front end for signing in to a remote build server and
//! managing the credentials signet keeps for it.

pub mod cli;
pub mod context;
pub mod output;
pub mod prompter;
