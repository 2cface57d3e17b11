//! Best-effort values for fields where availability beats accuracy.
//!
//! Timestamps and rendered post bodies never abort a mapping. When the raw
//! value cannot be interpreted the mapper substitutes a default and records
//! why, so callers and tests can tell a soft failure from a clean value.

use chrono::{DateTime, Utc};

use super::markdown::html_to_markdown;
use super::timestamp::parse_any;

/// A value that may have been substituted after a soft failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestEffort<T> {
    value: T,
    soft_failure: Option<String>,
}

impl<T> BestEffort<T> {
    /// A value obtained without trouble.
    pub fn exact(value: T) -> Self {
        Self {
            value,
            soft_failure: None,
        }
    }

    /// A substitute value and the reason the real one was unavailable.
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            soft_failure: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.soft_failure.is_some()
    }

    #[must_use]
    pub fn soft_failure(&self) -> Option<&str> {
        self.soft_failure.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Parse a backend timestamp, substituting the current time when it is
/// missing or unparsable.
#[must_use]
pub fn timestamp_or_now(raw: Option<&str>) -> BestEffort<DateTime<Utc>> {
    match raw {
        Some(raw) => match parse_any(raw) {
            Some(parsed) => BestEffort::exact(parsed),
            None => BestEffort::fallback(Utc::now(), format!("unparsable timestamp '{raw}'")),
        },
        None => BestEffort::fallback(Utc::now(), "missing timestamp"),
    }
}

/// Convert rendered HTML to markdown, keeping the HTML when conversion fails.
#[must_use]
pub fn markdown_or_raw(html: &str) -> BestEffort<String> {
    match html_to_markdown(html) {
        Ok(markdown) => BestEffort::exact(markdown),
        Err(e) => BestEffort::fallback(html.to_string(), e.to_string()),
    }
}
