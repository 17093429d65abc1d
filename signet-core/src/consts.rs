//! Core constants shared across signet components.

/// Service name every secret record is filed under.
pub const SERVICE_NAME: &str = "signet";

/// Account holding the server URL of the persisted sign-in.
pub const ACCOUNT_SERVER_URL: &str = "serverurl";

/// Account holding the username of the persisted sign-in.
pub const ACCOUNT_USERNAME: &str = "username";

/// Account holding the password of the persisted sign-in.
pub const ACCOUNT_PASSWORD: &str = "password";

/// Server URL suggested when nothing was used before.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8111";

/// Default bound for a remote validation round-trip, in seconds.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Default bound for a single native tool invocation, in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the Windows credential helper location.
pub const ENV_CREDS_TOOL: &str = "SIGNET_CREDS_TOOL";

/// Environment variable overriding the macOS `security` tool location.
pub const ENV_SECURITY_TOOL: &str = "SIGNET_SECURITY_TOOL";

/// File name of the token store used where no native store is assumed.
pub const TOKEN_FILE_NAME: &str = "credentials.json";
