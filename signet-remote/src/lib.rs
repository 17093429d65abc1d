//! # Signet Remote
//!
//! Login client for the build server's remote-access endpoint. Implements
//! [`signet_core::RemoteLogin`] over XML-RPC.

pub mod client;
pub mod consts;
pub mod xmlrpc;

pub use client::LoginClient;
