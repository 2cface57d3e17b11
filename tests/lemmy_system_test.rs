//! Integration tests for the Lemmy adapter.

use forumgate::config::{HttpSettings, LemmyConfig, LemmyCredentials, SystemConfig};
use forumgate::models::{Post, Reply};
use forumgate::system::lemmy::LemmyError;
use forumgate::system::{LemmySystem, System, SystemError, SystemKind};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn system_for(url: Option<String>, username: &str) -> LemmySystem {
    let mut system = LemmySystem::new(HttpSettings::default());
    system.set_id(1);
    system
        .set_config(SystemConfig::Lemmy(LemmyConfig {
            url,
            credentials: LemmyCredentials {
                username: username.to_string(),
                password: "hunter2".to_string(),
            },
        }))
        .unwrap();
    system
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v3/user/login"))
        .and(body_json(json!({"username_or_email": "me", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "token-123"})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_posts_after_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/post/list"))
        .and(query_param("type_", "Local"))
        .and(query_param("sort", "New"))
        .and(header("Authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": [
            {
                "post": {"id": 9, "name": "Hello fediverse", "body": "First!",
                         "published": "2023-06-01T12:00:00.123456", "locked": true,
                         "featured_community": true},
                "creator": {"id": 2, "name": "dave", "display_name": "Dave"},
                "community": {"id": 5, "name": "rust", "title": "Rust"}
            },
            {
                "post": {"id": 10, "name": "Link only", "body": null,
                         "published": "2023-06-02T09:00:00Z"},
                "creator": {"id": 3, "name": "erin"},
                "community": {"id": 6, "name": "news", "title": ""}
            }
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut system = system_for(Some(server.uri()), "me");
    let cancel = CancellationToken::new();
    system.load(&cancel).await.unwrap();
    let posts = system.list_posts(&cancel).await.unwrap();

    assert_eq!(posts.len(), 2);
    let first = &posts[0];
    assert_eq!(first.id, "9");
    assert_eq!(first.subject, "Hello fediverse");
    assert_eq!(first.body, "First!");
    assert!(first.pinned);
    assert!(first.closed);
    assert_eq!(first.author.name, "Dave");
    assert_eq!(first.forum.id, "5");
    assert_eq!(first.forum.name, "Rust");
    assert_eq!(first.sys_idx, 1);
    assert_eq!(first.created_at.to_rfc3339(), "2023-06-01T12:00:00.123456+00:00");

    let second = &posts[1];
    assert_eq!(second.body, "");
    assert_eq!(second.author.name, "erin");
    assert_eq!(second.forum.name, "news");
}

#[tokio::test]
async fn test_anonymous_load_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/user/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/post/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .mount(&server)
        .await;

    let mut system = system_for(Some(server.uri()), "");
    let cancel = CancellationToken::new();
    system.load(&cancel).await.unwrap();

    assert!(system.is_loaded());
    assert!(system.list_posts(&cancel).await.unwrap().is_empty());
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("Authorization").is_none());
}

#[tokio::test]
async fn test_rejected_login_fails_load() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/user/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "incorrect_login"})))
        .mount(&server)
        .await;

    let mut system = system_for(Some(server.uri()), "me");
    let err = system.load(&CancellationToken::new()).await.unwrap_err();

    match err {
        SystemError::Lemmy(LemmyError::Status { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "incorrect_login");
        }
        other => panic!("expected a login rejection, got {other:?}"),
    }
    assert!(!system.is_loaded());
}

#[tokio::test]
async fn test_unconfigured_lemmy_is_noop() {
    let mut system = system_for(None, "me");
    let cancel = CancellationToken::new();

    system.load(&cancel).await.unwrap();

    assert!(!system.is_loaded());
    assert_eq!(system.description(), "Lemmy");
    assert!(matches!(
        system.list_posts(&cancel).await,
        Err(SystemError::NotLoaded(SystemKind::Lemmy))
    ));
}

#[tokio::test]
async fn test_thread_and_write_operations_unsupported() {
    let system = system_for(None, "");
    let cancel = CancellationToken::new();

    let mut post = Post::default();
    let mut reply = Reply::default();

    assert!(matches!(
        system.load_post(&mut post, &cancel).await,
        Err(SystemError::Unsupported { operation: "load_post", .. })
    ));
    assert!(matches!(
        system.create_post(&mut post, &cancel).await,
        Err(SystemError::Unsupported { operation: "create_post", .. })
    ));
    assert!(matches!(
        system.create_reply(&mut reply, &cancel).await,
        Err(SystemError::Unsupported { operation: "create_reply", .. })
    ));
    assert_eq!(post, Post::default());
}
