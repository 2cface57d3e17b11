//! Minimal Lemmy v3 HTTP client: login and post listing.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::types::{ErrorResponse, Login, LoginResponse, PostsResponse};

#[derive(Debug, Error)]
pub enum LemmyError {
    #[error("cannot resolve '{location}' against the base URL: {source}")]
    ResourceResolution {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("lemmy returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("login succeeded without a token")]
    MissingToken,

    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct LemmyClient {
    http: reqwest::Client,
    endpoint: Url,
    jwt: Option<String>,
}

impl LemmyClient {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            jwt: None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.jwt.is_some()
    }

    /// Log in and keep the returned token for later requests.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a rejected login, or cancellation.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), LemmyError> {
        let body = Login {
            username_or_email: username,
            password,
        };
        let request = self.http.post(self.url("/api/v3/user/login")?).json(&body);
        let response: LoginResponse = self.execute(request, cancel).await?;
        self.jwt = Some(response.jwt.ok_or(LemmyError::MissingToken)?);
        Ok(())
    }

    /// Newest posts of the local instance.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, an undecodable
    /// body, or cancellation.
    pub async fn list_local_posts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PostsResponse, LemmyError> {
        let request = self
            .http
            .get(self.url("/api/v3/post/list")?)
            .query(&[("type_", "Local"), ("sort", "New")]);
        self.execute(request, cancel).await
    }

    fn url(&self, location: &str) -> Result<Url, LemmyError> {
        self.endpoint
            .join(location)
            .map_err(|source| LemmyError::ResourceResolution {
                location: location.to_string(),
                source,
            })
    }

    async fn execute<T>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, LemmyError>
    where
        T: DeserializeOwned,
    {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(jwt) = &self.jwt {
            request = request.header(AUTHORIZATION, format!("Bearer {jwt}"));
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LemmyError::Cancelled),
            response = request.send() => response?,
        };
        let status = response.status();
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LemmyError::Cancelled),
            body = response.bytes() => body?,
        };

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(LemmyError::Status { status, message });
        }

        serde_json::from_slice(&body).map_err(LemmyError::Decode)
    }
}
