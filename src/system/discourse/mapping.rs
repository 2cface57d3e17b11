//! Translation from Discourse wire shapes into the canonical model.

use tracing::{debug, Span};

use crate::models::{Author, Forum, Post, Reply};
use crate::system::fallback::{markdown_or_raw, timestamp_or_now, BestEffort};

use super::types::{Category, LatestTopicsPayload, PostModel, Topic, User};

/// Name of the category or subcategory with `category_id`.
///
/// Top-level categories are checked before their subcategories; an unknown
/// id yields an empty name.
#[must_use]
pub fn resolve_forum_name(categories: &[Category], category_id: i64) -> String {
    for category in categories {
        if category.id == category_id {
            return category.name.clone();
        }
        if let Some(sub) = category
            .subcategory_list
            .iter()
            .find(|sub| sub.id == category_id)
        {
            return sub.name.clone();
        }
    }
    String::new()
}

/// Display name of `user_id` in the listing's user directory, empty if absent.
#[must_use]
pub fn resolve_user_name(users: &[User], user_id: i64) -> String {
    users
        .iter()
        .find(|u| u.id == user_id)
        .map(|u| u.display_name().to_string())
        .unwrap_or_default()
}

/// Map every topic in a latest listing to a canonical post.
#[must_use]
pub fn map_latest(
    latest: &LatestTopicsPayload,
    categories: &[Category],
    sys_idx: usize,
    span: &Span,
) -> Vec<Post> {
    latest
        .topic_list
        .topics
        .iter()
        .map(|topic| map_topic(topic, &latest.users, categories, sys_idx, span))
        .collect()
}

fn map_topic(
    topic: &Topic,
    users: &[User],
    categories: &[Category],
    sys_idx: usize,
    span: &Span,
) -> Post {
    let author = topic
        .posters
        .first()
        .map(|poster| Author {
            id: poster.user_id.to_string(),
            name: resolve_user_name(users, poster.user_id),
        })
        .unwrap_or_default();

    let created_at = logged(timestamp_or_now(topic.created_at.as_deref()), topic.id, span);
    let last_commented_at = logged(
        timestamp_or_now(topic.last_posted_at.as_deref()),
        topic.id,
        span,
    );

    Post {
        id: topic.id.to_string(),
        subject: topic.title.clone(),
        body: String::new(),
        pinned: topic.pinned,
        closed: topic.closed,
        created_at,
        last_commented_at,
        author,
        forum: Forum {
            id: topic.category_id.to_string(),
            name: resolve_forum_name(categories, topic.category_id),
        },
        replies: Vec::new(),
        sys_idx,
    }
}

/// A thread split into its root body and ordered replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    pub body: String,
    pub replies: Vec<Reply>,
}

/// Rebuild a thread from a post stream.
///
/// The first post becomes the body, every following post a reply to
/// `post_id`, in stream order.
#[must_use]
pub fn map_thread(posts: &[PostModel], post_id: &str, sys_idx: usize, span: &Span) -> Thread {
    let mut thread = Thread::default();

    for (idx, raw) in posts.iter().enumerate() {
        let body = logged(markdown_or_raw(&raw.cooked), raw.id, span);

        if idx == 0 {
            thread.body = body;
            continue;
        }

        thread.replies.push(Reply {
            id: raw.id.to_string(),
            in_reply_to: post_id.to_string(),
            body,
            created_at: logged(timestamp_or_now(raw.created_at.as_deref()), raw.id, span),
            author: Author {
                id: raw.user_id.to_string(),
                name: raw.display_name().to_string(),
            },
            sys_idx,
        });
    }

    thread
}

fn logged<T>(value: BestEffort<T>, source_id: i64, span: &Span) -> T {
    if let Some(reason) = value.soft_failure() {
        debug!(parent: span, source_id, reason, "Substituted fallback value");
    }
    value.into_value()
}
