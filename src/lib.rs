//! # Signet
//!
//! Sign-in and credential lifecycle management for remote build servers.
//!
//! The core crate owns the credential model, the per-platform secret backends
//! and the sign-in flow; the remote crate provides the XML-RPC login client
//! the flow validates credentials against.

pub use signet_core::*;
pub use signet_remote::LoginClient;
