//! Shared constants used across the application.

/// User agent sent with every backend request.
pub const USER_AGENT: &str = concat!("forumgate/", env!("CARGO_PKG_VERSION"));

/// Default config file looked up when `FORUMGATE_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./forumgate.toml";
