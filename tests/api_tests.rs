// tests/api_tests.rs

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use memeboard::{
    config::Config,
    models::{
        Id,
        post::{NewPost, PostType},
    },
    routes,
    state::{AppState, SharedStore},
    store::{MemoryStore, PostStore},
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// Helper function to build the app over a fresh in-memory store.
/// Returns the router and the store so tests can provision users.
fn spawn_app() -> (Router, Arc<MemoryStore>) {
    let config = Config {
        database_url: None,
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        thread_max_depth: 4,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let store = Arc::new(MemoryStore::new());
    let shared: SharedStore = store.clone();
    let app = routes::create_router(AppState {
        store: shared,
        config,
    });

    (app, store)
}

fn token_for(user_id: Id) -> String {
    sign_jwt(user_id, TEST_SECRET, 600).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_text_post(app: &Router, token: &str) -> Id {
    let (status, post) = send(
        app,
        "POST",
        "/api/posts",
        Some(token),
        Some(json!({ "type": "text", "caption": "when the code compiles", "textContent": "first try" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    post["id"].as_i64().unwrap()
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (app, _) = spawn_app();

    let (status, _) = send(&app, "GET", "/random_path_that_does_not_exist", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_require_a_valid_token() {
    let (app, store) = spawn_app();
    let user = store.insert_user("carol", None).await;
    let post_id = create_text_post(&app, &token_for(user.id)).await;

    let (status, body) = send(&app, "POST", &format!("/api/posts/{post_id}/like"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/posts/{post_id}/comments"),
        Some("not-a-jwt"),
        Some(json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token for a user the store has never seen
    let (status, _) = send(&app, "POST", "/api/posts", Some(&token_for(4040)), Some(json!({ "type": "text", "textContent": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_creation_validates_type_specific_fields() {
    let (app, store) = spawn_app();
    let token = token_for(store.insert_user("dave", None).await.id);

    let (status, _) = send(&app, "POST", "/api/posts", Some(&token), Some(json!({ "type": "text", "textContent": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/posts", Some(&token), Some(json!({ "type": "image" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "type": "image", "contentUrl": "ftp://nope/a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "type": "image", "caption": "skull", "contentUrl": "https://cdn.example.com/posts/images/x.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["type"], "image");
    assert_eq!(post["contentUrl"], "https://cdn.example.com/posts/images/x.png");
}

#[tokio::test]
async fn feed_lists_newest_first_with_counts_and_viewer_flags() {
    let (app, store) = spawn_app();
    let author = store.insert_user("erin", Some("https://avatars.example.com/erin.png")).await;
    let token = token_for(author.id);

    let older = create_text_post(&app, &token).await;
    let newer = create_text_post(&app, &token).await;

    send(&app, "POST", &format!("/api/posts/{older}/like"), Some(&token), None).await;
    send(&app, "POST", &format!("/api/posts/{older}/comments"), Some(&token), Some(json!({ "content": "lol" }))).await;

    let (status, feed) = send(&app, "GET", "/api/posts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["id"].as_i64(), Some(newer));
    assert_eq!(feed[1]["id"].as_i64(), Some(older));
    assert_eq!(feed[1]["counts"]["likes"], 1);
    assert_eq!(feed[1]["counts"]["comments"], 1);
    assert_eq!(feed[1]["liked"], true);
    assert_eq!(feed[1]["skulled"], false);
    assert_eq!(feed[1]["author"]["displayName"], "erin");
    assert_eq!(feed[1]["author"]["image"], "https://avatars.example.com/erin.png");

    // Anonymous viewers see counts but no personal flags
    let (_, feed) = send(&app, "GET", "/api/posts?limit=1", None, None).await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["id"].as_i64(), Some(newer));

    let (status, post) = send(&app, "GET", &format!("/api/posts/{older}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["liked"], false);
    assert_eq!(post["counts"]["likes"], 1);

    let (status, _) = send(&app, "GET", "/api/posts/999999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn seed_posts(store: &MemoryStore, author_id: Id, count: usize) -> Vec<Id> {
    let mut ids = Vec::with_capacity(count);
    for n in 0..count {
        let post = store
            .insert_post(NewPost {
                author_id,
                caption: None,
                post_type: PostType::Text,
                text_content: Some(format!("post {n}")),
                content_url: None,
            })
            .await
            .unwrap();
        ids.push(post.id);
    }
    ids
}

fn feed_ids(feed: &Value) -> Vec<Id> {
    feed.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn feed_pages_with_a_cursor() {
    let (app, store) = spawn_app();
    let author = store.insert_user("gina", None).await;
    let mut ids = seed_posts(&store, author.id, 5).await;
    ids.reverse();

    let mut seen: Vec<Id> = Vec::new();
    let mut uri = "/api/posts?limit=2".to_string();
    loop {
        let (status, page) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let page_ids = feed_ids(&page);
        if page_ids.is_empty() {
            break;
        }
        assert!(page_ids.len() <= 2);
        seen.extend(&page_ids);

        let last = page.as_array().unwrap().last().unwrap();
        uri = format!(
            "/api/posts?limit=2&cursor={}&cursorId={}",
            last["createdAt"].as_str().unwrap(),
            last["id"]
        );
    }

    // Every post exactly once, newest first
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn feed_limit_is_clamped() {
    let (app, store) = spawn_app();
    let author = store.insert_user("hank", None).await;
    seed_posts(&store, author.id, 105).await;

    let (status, feed) = send(&app, "GET", "/api/posts?limit=500", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed_ids(&feed).len(), 100);

    let (_, feed) = send(&app, "GET", "/api/posts", None, None).await;
    assert_eq!(feed_ids(&feed).len(), 20);

    let (_, feed) = send(&app, "GET", "/api/posts?limit=0", None, None).await;
    assert_eq!(feed_ids(&feed).len(), 1);
}

#[tokio::test]
async fn comment_thread_round_trip() {
    let (app, store) = spawn_app();
    let user = store.insert_user("frank", None).await;
    let token = token_for(user.id);
    let post_id = create_text_post(&app, &token).await;
    let uri = format!("/api/posts/{post_id}/comments");

    let (status, thread) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread, json!([]));

    let (status, root) = send(&app, "POST", &uri, Some(&token), Some(json!({ "content": "  top level  " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(root["content"], "top level");
    assert_eq!(root["replyCount"], 0);
    assert_eq!(root["replies"], json!([]));
    assert_eq!(root["author"]["id"].as_i64(), Some(user.id));
    assert_eq!(root["author"]["displayName"], "frank");
    let root_id = root["id"].as_i64().unwrap();

    let (status, reply) = send(&app, "POST", &uri, Some(&token), Some(json!({ "content": "reply", "parentId": root_id }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["parentId"].as_i64(), Some(root_id));

    let (status, thread) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread[0]["id"].as_i64(), Some(root_id));
    assert_eq!(thread[0]["replyCount"], 1);
    assert_eq!(thread[0]["replies"][0]["content"], "reply");
    assert!(thread[0]["createdAt"].is_string());

    // A shallower fetch can be requested
    let (_, thread) = send(&app, "GET", &format!("{uri}?depth=0"), None, None).await;
    assert_eq!(thread[0]["replyCount"], 1);
    assert_eq!(thread[0]["replies"], json!([]));
}

#[tokio::test]
async fn invalid_comments_are_rejected() {
    let (app, store) = spawn_app();
    let token = token_for(store.insert_user("gina", None).await.id);
    let post_p = create_text_post(&app, &token).await;
    let post_q = create_text_post(&app, &token).await;

    let (_, on_q) = send(&app, "POST", &format!("/api/posts/{post_q}/comments"), Some(&token), Some(json!({ "content": "q" }))).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/posts/{post_p}/comments"),
        Some(&token),
        Some(json!({ "content": "cross", "parentId": on_q["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid parent comment");

    let (status, _) = send(&app, "POST", &format!("/api/posts/{post_p}/comments"), Some(&token), Some(json!({ "content": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_long = "x".repeat(1001);
    let (status, _) = send(&app, "POST", &format!("/api/posts/{post_p}/comments"), Some(&token), Some(json!({ "content": too_long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/posts/888888/comments", Some(&token), Some(json!({ "content": "ghost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/posts/not-a-number/comments", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reaction_routes_toggle_and_report_state() {
    let (app, store) = spawn_app();
    let token = token_for(store.insert_user("hank", None).await.id);
    let post_id = create_text_post(&app, &token).await;

    let (status, body) = send(&app, "POST", &format!("/api/posts/{post_id}/like"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "active": true }));

    let (_, body) = send(&app, "POST", &format!("/api/posts/{post_id}/reactions/like"), Some(&token), None).await;
    assert_eq!(body, json!({ "active": false }));

    let (_, body) = send(&app, "POST", &format!("/api/posts/{post_id}/skull"), Some(&token), None).await;
    assert_eq!(body, json!({ "active": true }));

    let (status, body) = send(&app, "POST", &format!("/api/posts/{post_id}/reactions/heart"), Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown reaction kind 'heart'");

    let (status, _) = send(&app, "POST", "/api/posts/123456/like", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn username_selection_flow() {
    let (app, store) = spawn_app();
    let ivy = token_for(store.insert_user("Ivy", None).await.id);
    let jack = token_for(store.insert_user("Jack", None).await.id);

    let (status, me) = send(&app, "GET", "/api/users/me", Some(&ivy), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["displayName"], "Ivy");
    assert_eq!(me["username"], Value::Null);

    let (status, body) = send(&app, "POST", "/api/users/me/username", Some(&ivy), Some(json!({ "username": "  Meme_Lord " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "username": "meme_lord" }));

    // Re-submitting one's own name is fine
    let (status, _) = send(&app, "POST", "/api/users/me/username", Some(&ivy), Some(json!({ "username": "meme_lord" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/users/me/username", Some(&jack), Some(json!({ "username": "MEME_LORD" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already taken");

    let (status, _) = send(&app, "POST", "/api/users/me/username", Some(&jack), Some(json!({ "username": "no spaces!" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/users/me/username", Some(&jack), Some(json!({ "username": "ab" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = send(&app, "GET", "/api/users/me", Some(&ivy), None).await;
    assert_eq!(me["displayName"], "meme_lord");
}
