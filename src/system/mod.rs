//! Backend adapters behind one forum-access contract.
//!
//! Each backend ("system") maps its own API onto the canonical
//! [`Post`]/[`Reply`] model. Callers build systems through the
//! [`SystemRegistry`](registry::SystemRegistry), inspect their declared
//! capabilities and then invoke the domain operations.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::config::SystemConfig;
use crate::models::{Post, Reply};

pub mod discourse;
pub mod fallback;
pub mod lemmy;
pub mod markdown;
pub mod registry;
pub mod retry;
pub mod timestamp;

pub use discourse::DiscourseSystem;
pub use lemmy::LemmySystem;
pub use registry::SystemRegistry;

/// Backend families this crate can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    Discourse,
    Lemmy,
}

impl SystemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discourse => "discourse",
            Self::Lemmy => "lemmy",
        }
    }

    /// Human-readable backend name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Discourse => "Discourse",
            Self::Lemmy => "Lemmy",
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feature tag a system declares. Declarations are not checked against
/// the live backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    pub id: &'static str,
    pub name: &'static str,
}

/// Capability set shared by every system.
#[must_use]
pub fn default_capabilities() -> Vec<Capability> {
    vec![
        Capability {
            id: "posts",
            name: "Posts",
        },
        Capability {
            id: "groups",
            name: "Groups",
        },
        Capability {
            id: "search",
            name: "Search",
        },
    ]
}

/// Errors surfaced by system operations.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Client(#[from] discourse::ClientError),

    #[error(transparent)]
    Lemmy(#[from] lemmy::LemmyError),

    /// An identifier that must be numeric for this backend was not
    #[error("invalid {field} '{value}': {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: SystemKind,
        operation: &'static str,
    },

    /// The system has no base URL configured, or `load` has not run
    #[error("{0} system is not loaded")]
    NotLoaded(SystemKind),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("expected {expected} configuration, got {found}")]
    WrongConfig {
        expected: SystemKind,
        found: SystemKind,
    },
}

impl SystemError {
    /// Whether the operation stopped because the caller cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Client(e) => matches!(e, discourse::ClientError::Cancelled),
            Self::Lemmy(e) => matches!(e, lemmy::LemmyError::Cancelled),
            _ => false,
        }
    }
}

/// The forum-access contract every backend implements.
///
/// Thread loading and the write operations are optional; the default
/// implementations fail with [`SystemError::Unsupported`].
#[async_trait]
pub trait System: Send + Sync {
    /// Index of this system among the configured ones.
    fn id(&self) -> usize;

    fn set_id(&mut self, id: usize);

    fn kind(&self) -> SystemKind;

    /// Replace the configuration. Takes effect on the next [`System::load`].
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::WrongConfig`] when the configuration is for
    /// another backend.
    fn set_config(&mut self, config: SystemConfig) -> Result<(), SystemError>;

    /// Parent span for everything the system logs.
    fn set_logger(&mut self, span: Span);

    /// Build the backend client from the current configuration.
    ///
    /// A system without a base URL loads as a no-op.
    async fn load(&mut self, cancel: &CancellationToken) -> Result<(), SystemError>;

    fn is_loaded(&self) -> bool;

    fn capabilities(&self) -> Vec<Capability> {
        default_capabilities()
    }

    fn has_capability(&self, id: &str) -> bool {
        self.capabilities().iter().any(|c| c.id == id)
    }

    /// The configured base URL, empty when unconfigured.
    fn title(&self) -> String;

    fn description(&self) -> String {
        self.kind().display_name().to_string()
    }

    /// Label used when filtering lists by system.
    fn filter_value(&self) -> String {
        format!("{} {}", self.kind().display_name(), self.title())
    }

    async fn list_posts(&self, cancel: &CancellationToken) -> Result<Vec<Post>, SystemError>;

    async fn load_post(
        &self,
        _post: &mut Post,
        _cancel: &CancellationToken,
    ) -> Result<(), SystemError> {
        Err(SystemError::Unsupported {
            kind: self.kind(),
            operation: "load_post",
        })
    }

    async fn create_post(
        &self,
        _post: &mut Post,
        _cancel: &CancellationToken,
    ) -> Result<(), SystemError> {
        Err(SystemError::Unsupported {
            kind: self.kind(),
            operation: "create_post",
        })
    }

    async fn create_reply(
        &self,
        _reply: &mut Reply,
        _cancel: &CancellationToken,
    ) -> Result<(), SystemError> {
        Err(SystemError::Unsupported {
            kind: self.kind(),
            operation: "create_reply",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let ids: Vec<_> = default_capabilities().iter().map(|c| c.id).collect();
        assert_eq!(ids, ["posts", "groups", "search"]);
    }

    #[test]
    fn test_unsupported_display() {
        let err = SystemError::Unsupported {
            kind: SystemKind::Lemmy,
            operation: "create_post",
        };
        assert_eq!(err.to_string(), "lemmy does not support create_post");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(SystemError::from(discourse::ClientError::Cancelled).is_cancelled());
        assert!(SystemError::from(lemmy::LemmyError::Cancelled).is_cancelled());
        assert!(!SystemError::NotLoaded(SystemKind::Discourse).is_cancelled());
    }
}
