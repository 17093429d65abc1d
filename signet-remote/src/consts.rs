//! Constants for the build server login client.

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("signet/", env!("CARGO_PKG_VERSION"));

/// Path of the XML-RPC endpoint, relative to the server URL.
pub const RPC_PATH: &str = "RPC2";

/// XML-RPC method exchanging a username and password for a session.
pub const AUTHENTICATE_METHOD: &str = "RemoteAuthenticationServer.authenticate";
