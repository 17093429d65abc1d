//! Test utilities shared across the signet workspace
//!
//! This crate provides common testing infrastructure including:
//! - XDG directory mocking ([`EnvTestGuard`])
//! - Single environment variable overrides ([`EnvVarGuard`])
//! - Fake native credential tools ([`FakeToolGuard`], unix only)
//! - Capturing log output ([`LogCapture`])
//!
//! The clippy dead_code lint is disabled for this crate because test utilities
//! may not be used by all tests, and the compiler cannot detect usage across
//! crate boundaries in development dependencies.

#![allow(dead_code)]

pub mod env;
pub mod logs;
#[cfg(unix)]
pub mod tool;

// Re-export commonly used items
pub use env::{EnvTestGuard, EnvVarGuard};
pub use logs::LogCapture;
#[cfg(unix)]
pub use tool::FakeToolGuard;
