//! Backend-agnostic forum model shared by every system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a post or reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// The board, category or community a post lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: String,
    pub name: String,
}

/// A thread root.
///
/// `id` stays empty until the backend has persisted the post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub subject: String,
    /// Markdown body.
    pub body: String,

    pub pinned: bool,
    pub closed: bool,

    pub created_at: DateTime<Utc>,
    pub last_commented_at: DateTime<Utc>,

    pub author: Author,
    pub forum: Forum,

    /// Replies in thread order.
    pub replies: Vec<Reply>,

    /// Index of the system that produced this post.
    pub sys_idx: usize,
}

/// A reply inside a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Backend identifier. Before creation this carries the reply target,
    /// see [`crate::system::discourse::ReplyTarget`].
    pub id: String,
    /// Post identifier being replied to, empty when replying to the topic.
    pub in_reply_to: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    pub sys_idx: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_has_no_id() {
        let post = Post::default();
        assert!(post.id.is_empty());
        assert!(post.replies.is_empty());
    }

    #[test]
    fn test_post_json_shape() {
        let post = Post {
            id: "12".to_string(),
            subject: "Hello".to_string(),
            forum: Forum {
                id: "3".to_string(),
                name: "General".to_string(),
            },
            ..Post::default()
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], "12");
        assert_eq!(json["forum"]["name"], "General");
        assert_eq!(json["sys_idx"], 0);

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }
}
