//! # Signet Core Library
//!
//! Credential lifecycle for a remote build-server client: platform secret
//! backends and the parsers for their native tools, the persistent storage
//! manager, the session credential cache and the sign-in flow tying them
//! together. Front ends supply a [`signin::RemoteLogin`] and a
//! [`signin::Prompter`].

pub mod config;
pub mod consts;
pub mod creds;
pub mod session;
pub mod settings;
pub mod signin;

// Re-export main types for front ends
pub use config::{ConfigDirs, SignetConfig, get_config_dirs};
pub use creds::{
  BackendCapability, BackendError, BackendKind, Credentials, PersistentStorageManager, SecretBackend, SecretRecord,
  StoredCredentials,
};
pub use session::SessionCredentialCache;
pub use settings::{FileSettings, Settings, SettingsStore};
pub use signin::{
  CredentialSource, LoginError, PersistAction, Prompter, RemoteLogin, SignInFlow, SignInMode, SignInOptions,
  SignInOutcome, StoreDecision, WelcomeResponse,
};
