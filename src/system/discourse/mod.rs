//! Discourse backend.
//!
//! [`Client`] speaks the JSON API with User API key authentication;
//! [`DiscourseSystem`] adapts it to the [`System`] contract.

mod categories;
mod client;
mod error;
pub mod mapping;
mod posts;
mod topics;
pub mod types;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Span};

use crate::config::{validate_base_url, DiscourseConfig, HttpSettings, SystemConfig};
use crate::constants;
use crate::models::{Post, Reply};

use super::{System, SystemError, SystemKind};

pub use categories::Categories;
pub use client::{Client, ClientConfig};
pub use error::{ClientError, RequestError};
pub use posts::Posts;
pub use topics::Topics;

use types::CreatePostModel;

/// Where a new reply is attached.
///
/// On input, [`Reply::id`] names the thing being replied to: the topic
/// itself when `in_reply_to` is empty, otherwise the post number inside the
/// topic named by `in_reply_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    Topic { topic_id: i64 },
    Post { topic_id: i64, post_number: i64 },
}

impl ReplyTarget {
    /// Interpret the input fields of `reply`.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::InvalidId`] if either identifier is not an integer.
    pub fn from_reply(reply: &Reply) -> Result<Self, SystemError> {
        let id = parse_id("reply id", &reply.id)?;
        if reply.in_reply_to.is_empty() {
            return Ok(Self::Topic { topic_id: id });
        }
        let topic_id = parse_id("in_reply_to", &reply.in_reply_to)?;
        Ok(Self::Post {
            topic_id,
            post_number: id,
        })
    }

    #[must_use]
    pub fn topic_id(&self) -> i64 {
        match *self {
            Self::Topic { topic_id } | Self::Post { topic_id, .. } => topic_id,
        }
    }

    #[must_use]
    pub fn post_number(&self) -> Option<i64> {
        match *self {
            Self::Topic { .. } => None,
            Self::Post { post_number, .. } => Some(post_number),
        }
    }
}

fn parse_id(field: &'static str, value: &str) -> Result<i64, SystemError> {
    value.parse().map_err(|source| SystemError::InvalidId {
        field,
        value: value.to_string(),
        source,
    })
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Discourse adapter.
pub struct DiscourseSystem {
    id: usize,
    config: DiscourseConfig,
    http: HttpSettings,
    span: Span,
    client: Option<Client>,
}

impl DiscourseSystem {
    #[must_use]
    pub fn new(http: HttpSettings) -> Self {
        Self {
            id: 0,
            config: DiscourseConfig::default(),
            http,
            span: Span::none(),
            client: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DiscourseConfig {
        &self.config
    }

    fn client(&self) -> Result<&Client, SystemError> {
        self.client
            .as_ref()
            .ok_or(SystemError::NotLoaded(SystemKind::Discourse))
    }
}

#[async_trait]
impl System for DiscourseSystem {
    fn id(&self) -> usize {
        self.id
    }

    fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    fn kind(&self) -> SystemKind {
        SystemKind::Discourse
    }

    fn set_config(&mut self, config: SystemConfig) -> Result<(), SystemError> {
        match config {
            SystemConfig::Discourse(config) => {
                self.config = config;
                Ok(())
            }
            other => Err(SystemError::WrongConfig {
                expected: SystemKind::Discourse,
                found: other.kind(),
            }),
        }
    }

    fn set_logger(&mut self, span: Span) {
        self.span = span;
    }

    async fn load(&mut self, _cancel: &CancellationToken) -> Result<(), SystemError> {
        let Some(raw) = self.config.url.as_deref() else {
            debug!(parent: &self.span, "No url configured, skipping load");
            self.client = None;
            return Ok(());
        };

        let endpoint = validate_base_url(raw).map_err(SystemError::InvalidConfig)?;

        let http_client = reqwest::Client::builder()
            .user_agent(constants::USER_AGENT)
            .timeout(self.http.timeout())
            .build()
            .map_err(ClientError::from)?;

        let config = ClientConfig::new(endpoint, self.config.credentials.clone())
            .with_http_client(http_client)
            .with_retry(self.http.retry_policy())
            .with_span(self.span.clone());

        self.client = Some(Client::new(config));
        info!(parent: &self.span, url = %raw, "Discourse system loaded");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.client.is_some()
    }

    fn title(&self) -> String {
        self.config.url.clone().unwrap_or_default()
    }

    async fn list_posts(&self, cancel: &CancellationToken) -> Result<Vec<Post>, SystemError> {
        let client = self.client()?;

        let categories = client.categories().list(cancel).await?;
        let latest = client.topics().list_latest(cancel).await?;

        let posts = mapping::map_latest(&latest, &categories.categories, self.id, &self.span);
        debug!(parent: &self.span, count = posts.len(), "Listed posts");
        Ok(posts)
    }

    async fn load_post(&self, post: &mut Post, cancel: &CancellationToken) -> Result<(), SystemError> {
        let client = self.client()?;

        let detail = client.topics().show(&post.id, cancel).await?;
        let thread = mapping::map_thread(&detail.post_stream.posts, &post.id, self.id, &self.span);

        debug!(
            parent: &self.span,
            post_id = %post.id,
            replies = thread.replies.len(),
            "Loaded thread"
        );
        post.body = thread.body;
        post.replies = thread.replies;
        Ok(())
    }

    async fn create_post(&self, post: &mut Post, cancel: &CancellationToken) -> Result<(), SystemError> {
        let category = parse_id("forum id", &post.forum.id)?;
        let client = self.client()?;

        let model = CreatePostModel {
            title: Some(post.subject.clone()),
            raw: post.body.clone(),
            category: Some(category),
            created_at: now_rfc3339(),
            ..CreatePostModel::default()
        };

        let created = client.posts().create(&model, cancel).await?;
        post.id = created.id.to_string();
        info!(parent: &self.span, post_id = %post.id, category, "Created post");
        Ok(())
    }

    async fn create_reply(&self, reply: &mut Reply, cancel: &CancellationToken) -> Result<(), SystemError> {
        let target = ReplyTarget::from_reply(reply)?;
        let client = self.client()?;
        debug!(parent: &self.span, ?target, "Creating reply");

        let model = CreatePostModel {
            raw: reply.body.clone(),
            topic_id: Some(target.topic_id()),
            reply_to_post_number: target.post_number(),
            created_at: now_rfc3339(),
            ..CreatePostModel::default()
        };

        let created = client.posts().create(&model, cancel).await?;
        reply.id = created.id.to_string();
        info!(parent: &self.span, reply_id = %reply.id, "Created reply");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LemmyConfig;

    fn reply(id: &str, in_reply_to: &str) -> Reply {
        Reply {
            id: id.to_string(),
            in_reply_to: in_reply_to.to_string(),
            ..Reply::default()
        }
    }

    #[test]
    fn test_reply_target_topic() {
        let target = ReplyTarget::from_reply(&reply("12", "")).unwrap();
        assert_eq!(target, ReplyTarget::Topic { topic_id: 12 });
        assert_eq!(target.topic_id(), 12);
        assert_eq!(target.post_number(), None);
    }

    #[test]
    fn test_reply_target_post() {
        let target = ReplyTarget::from_reply(&reply("3", "12")).unwrap();
        assert_eq!(
            target,
            ReplyTarget::Post {
                topic_id: 12,
                post_number: 3
            }
        );
        assert_eq!(target.post_number(), Some(3));
    }

    #[test]
    fn test_reply_target_invalid() {
        let err = ReplyTarget::from_reply(&reply("abc", "")).unwrap_err();
        assert!(matches!(err, SystemError::InvalidId { field: "reply id", .. }));

        let err = ReplyTarget::from_reply(&reply("3", "topic")).unwrap_err();
        assert!(matches!(err, SystemError::InvalidId { field: "in_reply_to", .. }));
    }

    #[test]
    fn test_set_config_rejects_other_backend() {
        let mut system = DiscourseSystem::new(HttpSettings::default());
        let err = system
            .set_config(SystemConfig::Lemmy(LemmyConfig::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            SystemError::WrongConfig {
                expected: SystemKind::Discourse,
                found: SystemKind::Lemmy
            }
        ));
    }

    #[test]
    fn test_display_accessors() {
        let mut system = DiscourseSystem::new(HttpSettings::default());
        system
            .set_config(SystemConfig::Discourse(DiscourseConfig {
                url: Some("https://forum.example.com".to_string()),
                ..DiscourseConfig::default()
            }))
            .unwrap();

        assert_eq!(system.title(), "https://forum.example.com");
        assert_eq!(system.description(), "Discourse");
        assert_eq!(system.filter_value(), "Discourse https://forum.example.com");
    }

    #[test]
    fn test_created_at_has_nanoseconds() {
        let stamp = now_rfc3339();
        assert!(stamp.ends_with('Z'));
        let fraction = stamp.split('.').nth(1).unwrap();
        assert_eq!(fraction.len(), "123456789Z".len());
    }

    #[tokio::test]
    async fn test_unconfigured_load_is_noop() {
        let mut system = DiscourseSystem::new(HttpSettings::default());
        let cancel = CancellationToken::new();

        system.load(&cancel).await.unwrap();
        assert!(!system.is_loaded());

        let err = system.list_posts(&cancel).await.unwrap_err();
        assert!(matches!(err, SystemError::NotLoaded(SystemKind::Discourse)));
    }
}
