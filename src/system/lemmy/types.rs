//! Wire shapes of the Lemmy v3 API used by the adapter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Login<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub jwt: Option<String>,
}

/// Error body: `{"error": "incorrect_login"}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostsResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostView {
    pub post: PostRecord,
    pub creator: Person,
    pub community: Community,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostRecord {
    pub id: i64,
    pub name: String,
    pub body: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub locked: bool,
    pub featured_community: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
}

impl Person {
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub title: String,
}

impl Community {
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_view_decodes() {
        let body = r#"{"posts":[{
            "post": {"id": 9, "name": "Hello", "body": null, "published": "2023-06-01T12:00:00.123456",
                     "locked": true, "featured_community": false, "nsfw": false},
            "creator": {"id": 2, "name": "dave", "display_name": null},
            "community": {"id": 5, "name": "rust", "title": "Rust"},
            "counts": {"comments": 3}
        }]}"#;
        let response: PostsResponse = serde_json::from_str(body).unwrap();

        let view = &response.posts[0];
        assert_eq!(view.post.id, 9);
        assert!(view.post.locked);
        assert_eq!(view.post.body, None);
        assert_eq!(view.creator.display_name(), "dave");
        assert_eq!(view.community.display_name(), "Rust");
    }

    #[test]
    fn test_login_serializes() {
        let login = Login {
            username_or_email: "me",
            password: "pw",
        };
        let json = serde_json::to_value(&login).unwrap();
        assert_eq!(json, serde_json::json!({"username_or_email": "me", "password": "pw"}));
    }
}
