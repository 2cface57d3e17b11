//! Wire shapes of the Discourse JSON API.
//!
//! Payload structs default every field so that error bodies, which carry only
//! the envelope, still decode.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields shared by every response, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_default")]
    pub timestamp: i64,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl Envelope {
    /// Best human-readable description of the response.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.message.is_empty() {
            return self.message.clone();
        }
        if !self.errors.is_empty() {
            return self.errors.join("; ");
        }
        self.error_type
            .clone()
            .unwrap_or_else(|| self.kind.clone())
    }
}

/// A decoded response: envelope plus resource payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response<T> {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub payload: T,
}

// Categories

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoriesPayload {
    pub category_list: CategoryList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_default")]
    pub subcategory_list: Vec<Category>,
}

// Topics

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LatestTopicsPayload {
    pub users: Vec<User>,
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub username: String,
    pub name: Option<String>,
}

impl User {
    /// Display name, falling back to the username when no name is set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicList {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    pub created_at: Option<String>,
    pub last_posted_at: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub pinned: bool,
    #[serde(deserialize_with = "null_default")]
    pub closed: bool,
    #[serde(deserialize_with = "null_default")]
    pub category_id: i64,
    #[serde(deserialize_with = "null_default")]
    pub posters: Vec<Poster>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Poster {
    pub user_id: i64,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
}

/// A topic with its post stream (`/t/{id}.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicDetail {
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    pub post_stream: PostStream,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostStream {
    pub posts: Vec<PostModel>,
}

// Posts

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostModel {
    pub id: i64,
    pub topic_id: i64,
    pub post_number: i64,
    pub user_id: i64,
    pub name: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub username: String,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub cooked: String,
    pub reply_to_post_number: Option<i64>,
}

impl PostModel {
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Body of `POST /posts.json`, for both new topics and replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatePostModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_post_number: Option<i64>,
}
