//! Error types for the Discourse client.

use reqwest::{Method, StatusCode, Url};
use thiserror::Error;

use super::types::Envelope;

/// Discourse client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relative location could not be joined onto the base URL
    #[error("cannot resolve '{location}' against the base URL: {source}")]
    ResourceResolution {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// The request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Sending the request or reading the response failed
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Every attempt came back with a retryable status
    #[error("{method} {url} giving up after {attempts} attempt(s), last status {status}")]
    RetriesExhausted {
        method: Method,
        url: Url,
        attempts: u32,
        status: StatusCode,
    },

    /// The response body was not the expected JSON
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The backend answered with a non-2xx status
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The caller cancelled the operation
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// The backend's error envelope, when the failure came from the backend.
    #[must_use]
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the request never produced a usable response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RetriesExhausted { .. } | Self::Decode(_)
        )
    }
}

/// A decoded error response from the backend.
#[derive(Debug, Clone, Error)]
#[error("non-2xx status code {status}: {}", .envelope.summary())]
pub struct RequestError {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl RequestError {
    /// The semantic error category (`type` in the envelope).
    #[must_use]
    pub fn kind(&self) -> &str {
        if self.envelope.kind.is_empty() {
            self.envelope.error_type.as_deref().unwrap_or_default()
        } else {
            &self.envelope.kind
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.envelope.message
    }

    #[must_use]
    pub fn validation(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.envelope.validation.as_ref()
    }
}
