//! Lemmy backend.
//!
//! Only listing is supported; thread loading and the write operations fall
//! back to the contract's "unsupported" defaults.

mod client;
pub mod types;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Span};

use crate::config::{validate_base_url, HttpSettings, LemmyConfig, SystemConfig};
use crate::constants;
use crate::models::{Author, Forum, Post};

use super::fallback::timestamp_or_now;
use super::{System, SystemError, SystemKind};

pub use client::{LemmyClient, LemmyError};

use types::PostView;

pub struct LemmySystem {
    id: usize,
    config: LemmyConfig,
    http: HttpSettings,
    span: Span,
    client: Option<LemmyClient>,
}

impl LemmySystem {
    #[must_use]
    pub fn new(http: HttpSettings) -> Self {
        Self {
            id: 0,
            config: LemmyConfig::default(),
            http,
            span: Span::none(),
            client: None,
        }
    }

    fn map_post(&self, view: &PostView) -> Post {
        let created = timestamp_or_now(view.post.published.as_deref());
        if let Some(reason) = created.soft_failure() {
            debug!(parent: &self.span, post_id = view.post.id, reason, "Substituted fallback value");
        }
        let created_at = created.into_value();
        let last_commented_at = view
            .post
            .updated
            .as_deref()
            .and_then(super::timestamp::parse_any)
            .unwrap_or(created_at);

        Post {
            id: view.post.id.to_string(),
            subject: view.post.name.clone(),
            body: view.post.body.clone().unwrap_or_default(),
            pinned: view.post.featured_community,
            closed: view.post.locked,
            created_at,
            last_commented_at,
            author: Author {
                id: view.creator.id.to_string(),
                name: view.creator.display_name().to_string(),
            },
            forum: Forum {
                id: view.community.id.to_string(),
                name: view.community.display_name().to_string(),
            },
            replies: Vec::new(),
            sys_idx: self.id,
        }
    }
}

#[async_trait]
impl System for LemmySystem {
    fn id(&self) -> usize {
        self.id
    }

    fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    fn kind(&self) -> SystemKind {
        SystemKind::Lemmy
    }

    fn set_config(&mut self, config: SystemConfig) -> Result<(), SystemError> {
        match config {
            SystemConfig::Lemmy(config) => {
                self.config = config;
                Ok(())
            }
            other => Err(SystemError::WrongConfig {
                expected: SystemKind::Lemmy,
                found: other.kind(),
            }),
        }
    }

    fn set_logger(&mut self, span: Span) {
        self.span = span;
    }

    async fn load(&mut self, cancel: &CancellationToken) -> Result<(), SystemError> {
        let Some(raw) = self.config.url.as_deref() else {
            debug!(parent: &self.span, "No url configured, skipping load");
            self.client = None;
            return Ok(());
        };

        let endpoint = validate_base_url(raw).map_err(SystemError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .user_agent(constants::USER_AGENT)
            .timeout(self.http.timeout())
            .build()
            .map_err(LemmyError::from)?;

        let mut client = LemmyClient::new(http, endpoint);
        let credentials = &self.config.credentials;
        if credentials.username.is_empty() {
            debug!(parent: &self.span, "No username configured, browsing anonymously");
        } else {
            client
                .login(&credentials.username, &credentials.password, cancel)
                .await?;
            info!(parent: &self.span, username = %credentials.username, "Logged in");
        }

        self.client = Some(client);
        info!(parent: &self.span, url = %raw, "Lemmy system loaded");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.client.is_some()
    }

    fn title(&self) -> String {
        self.config.url.clone().unwrap_or_default()
    }

    async fn list_posts(&self, cancel: &CancellationToken) -> Result<Vec<Post>, SystemError> {
        let client = self
            .client
            .as_ref()
            .ok_or(SystemError::NotLoaded(SystemKind::Lemmy))?;

        let response = client.list_local_posts(cancel).await?;
        Ok(response.posts.iter().map(|view| self.map_post(view)).collect())
    }
}
