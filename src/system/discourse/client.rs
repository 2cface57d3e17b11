//! Authenticated Discourse API client with bounded retry.

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Span};

use crate::config::DiscourseCredentials;
use crate::constants;
use crate::system::retry::RetryPolicy;

use super::categories::Categories;
use super::error::{ClientError, RequestError};
use super::posts::Posts;
use super::topics::Topics;
use super::types::Response;

const HEADER_CLIENT_ID: &str = "User-Api-Client-Id";
const HEADER_API_KEY: &str = "User-Api-Key";

/// Everything needed to build a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub credentials: DiscourseCredentials,
    pub http_client: reqwest::Client,
    pub retry: RetryPolicy,
    /// Parent span for retry logging.
    pub span: Span,
}

impl ClientConfig {
    #[must_use]
    pub fn new(endpoint: Url, credentials: DiscourseCredentials) -> Self {
        Self {
            endpoint,
            credentials,
            http_client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Discourse API client.
///
/// Resource operations live on the handlers returned by [`Client::categories`],
/// [`Client::topics`] and [`Client::posts`].
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    credentials: DiscourseCredentials,
    retry: RetryPolicy,
    span: Span,
}

/// Why an attempt is being repeated.
enum Transient {
    Send(reqwest::Error),
    Status(StatusCode),
}

impl Client {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: config.http_client,
            endpoint: config.endpoint,
            credentials: config.credentials,
            retry: config.retry,
            span: config.span,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn categories(&self) -> Categories<'_> {
        Categories::new(self)
    }

    #[must_use]
    pub fn topics(&self) -> Topics<'_> {
        Topics::new(self)
    }

    #[must_use]
    pub fn posts(&self) -> Posts<'_> {
        Posts::new(self)
    }

    /// Build an authenticated request for `location` relative to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be resolved, the body cannot
    /// be encoded, or the headers are not valid header values.
    pub fn new_request<B>(
        &self,
        method: Method,
        location: &str,
        body: Option<&B>,
    ) -> Result<Request, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self
            .endpoint
            .join(location)
            .map_err(|source| ClientError::ResourceResolution {
                location: location.to_string(),
                source,
            })?;

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, constants::USER_AGENT)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_CLIENT_ID, self.credentials.client_id.as_str())
            .header(HEADER_API_KEY, self.credentials.key.as_str());

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(ClientError::Encode)?;
            builder = builder.body(encoded);
        }

        Ok(builder.build()?)
    }

    /// Build a body-less GET request.
    ///
    /// # Errors
    ///
    /// See [`Client::new_request`].
    pub fn get_request(&self, location: &str) -> Result<Request, ClientError> {
        self.new_request::<()>(Method::GET, location, None)
    }

    /// Execute a request and decode the response envelope.
    ///
    /// The body is decoded before the status is looked at, so a non-2xx
    /// response only becomes [`ClientError::Request`] when its body is valid
    /// JSON; otherwise it surfaces as [`ClientError::Decode`].
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, undecodable body, a status
    /// outside 200..=204, or cancellation.
    pub async fn execute<T>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.dispatch(request, cancel).await?;

        let content: Response<T> = serde_json::from_slice(&body).map_err(ClientError::Decode)?;

        if !is_success(status) {
            return Err(RequestError {
                status,
                envelope: content.envelope,
            }
            .into());
        }

        Ok(content)
    }

    /// Run the retry loop and read the final response fully into memory.
    async fn dispatch(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let max_attempts = self.retry.max_attempts();

        let mut current = request;
        let mut attempt = 1;

        loop {
            let retry_copy = current.try_clone();

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                outcome = self.http.execute(current) => outcome,
            };

            let transient = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if !RetryPolicy::is_retryable_status(status.as_u16()) {
                        let body = tokio::select! {
                            biased;
                            () = cancel.cancelled() => return Err(ClientError::Cancelled),
                            body = response.bytes() => body?.to_vec(),
                        };
                        debug!(parent: &self.span, %method, %url, %status, attempt, "Request complete");
                        return Ok((status, body));
                    }
                    Transient::Status(status)
                }
                Err(e) if is_transient(&e) => Transient::Send(e),
                Err(e) => return Err(e.into()),
            };

            let next = match retry_copy {
                Some(next) if attempt < max_attempts => next,
                _ => {
                    warn!(parent: &self.span, %method, %url, attempt, "Giving up on request");
                    return Err(match transient {
                        Transient::Send(e) => ClientError::Transport(e),
                        Transient::Status(status) => ClientError::RetriesExhausted {
                            method,
                            url,
                            attempts: attempt,
                            status,
                        },
                    });
                }
            };

            let wait = self.retry.delay_after(attempt);
            match &transient {
                Transient::Send(e) => warn!(
                    parent: &self.span,
                    %method, %url, attempt, max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    "Request failed: {e}, retrying"
                ),
                Transient::Status(status) => warn!(
                    parent: &self.span,
                    %method, %url, %status, attempt, max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    "Retryable status, retrying"
                ),
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }

            current = next;
            attempt += 1;
        }
    }
}

fn is_success(status: StatusCode) -> bool {
    (200..=204).contains(&status.as_u16())
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
