use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::DEFAULT_CONFIG_PATH;
use crate::system::retry::RetryPolicy;
use crate::system::SystemKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from a TOML file.
///
/// ```toml
/// [http]
/// timeout_secs = 30
///
/// [[systems]]
/// type = "discourse"
/// url = "https://forum.example.com"
///
/// [systems.credentials]
/// client_id = "..."
/// key = "..."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub systems: Vec<SystemConfig>,
}

/// Transport settings shared by every system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub retry_wait_min_ms: u64,
    pub retry_wait_max_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_wait_min_ms: 1_000,
            retry_wait_max_ms: 30_000,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_wait_min_ms, self.retry_wait_max_ms)
    }
}

/// Per-backend configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SystemConfig {
    Discourse(DiscourseConfig),
    Lemmy(LemmyConfig),
}

impl SystemConfig {
    #[must_use]
    pub fn kind(&self) -> SystemKind {
        match self {
            Self::Discourse(_) => SystemKind::Discourse,
            Self::Lemmy(_) => SystemKind::Lemmy,
        }
    }

    /// Base URL, `None` when the system is intentionally left unconfigured.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Discourse(c) => c.url.as_deref(),
            Self::Lemmy(c) => c.url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscourseConfig {
    pub url: Option<String>,
    #[serde(default)]
    pub credentials: DiscourseCredentials,
}

/// User API credentials. Missing entries are sent as empty header values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscourseCredentials {
    pub client_id: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LemmyConfig {
    pub url: Option<String>,
    #[serde(default)]
    pub credentials: LemmyCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LemmyCredentials {
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from the file named by `FORUMGATE_CONFIG`
    /// (or the default path), then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env_or_default("FORUMGATE_CONFIG", DEFAULT_CONFIG_PATH);
        let mut config = Self::from_path(Path::new(&path))?;

        config.http.timeout_secs =
            parse_env_u64("FORUMGATE_HTTP_TIMEOUT_SECS", config.http.timeout_secs)?;
        config.http.retry_wait_min_ms =
            parse_env_u64("FORUMGATE_RETRY_WAIT_MIN_MS", config.http.retry_wait_min_ms)?;
        config.http.retry_wait_max_ms =
            parse_env_u64("FORUMGATE_RETRY_WAIT_MAX_MS", config.http.retry_wait_max_ms)?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML, unknown keys or unknown system types.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "http.timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.http.retry_wait_min_ms > self.http.retry_wait_max_ms {
            return Err(ConfigError::InvalidValue {
                name: "http.retry_wait_min_ms".to_string(),
                message: "cannot exceed http.retry_wait_max_ms".to_string(),
            });
        }
        for (idx, system) in self.systems.iter().enumerate() {
            if let Some(raw) = system.url() {
                validate_base_url(raw).map_err(|message| ConfigError::InvalidValue {
                    name: format!("systems[{idx}].url"),
                    message,
                })?;
            }
        }
        Ok(())
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub(crate) fn validate_base_url(raw: &str) -> Result<url::Url, String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
