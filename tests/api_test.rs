use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use newsroom::notify::NoopNotifier;
use newsroom::server::{create_router, AppState};
use newsroom::service::NewsService;
use newsroom::storage::InMemoryStorage;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let service = Arc::new(NewsService::new(
        Arc::new(InMemoryStorage::new()),
        Arc::new(NoopNotifier),
    ));
    create_router(AppState { service })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "testpass123",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "newsroom");
}

#[tokio::test]
async fn register_login_whoami() {
    let app = app();
    let token = register(&app, "alice", "reader").await;

    let (status, body) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "reader");

    // A fresh login works too
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "testpass123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    // Logout revokes the token
    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approval_workflow_over_http() {
    let app = app();
    let editor = register(&app, "editor", "editor").await;
    let journo = register(&app, "journo", "journalist").await;
    let reader = register(&app, "reader", "reader").await;

    // Editor opens a publishing house
    let (status, publisher) = send(
        &app,
        "POST",
        "/api/publishers",
        Some(&editor),
        Some(json!({ "name": "Daily Bugle", "description": "city desk" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let publisher_id = publisher["id"].as_str().unwrap().to_string();

    // Journalist joins and files a story
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/publishers/{publisher_id}/join"),
        Some(&journo),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, article) = send(
        &app,
        "POST",
        "/api/articles",
        Some(&journo),
        Some(json!({
            "title": "Big story",
            "content": "Something happened.",
            "publisher_id": publisher_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(article["is_approved"], false);
    assert_eq!(article["publisher_name"], "Daily Bugle");
    let article_id = article["id"].as_str().unwrap().to_string();

    // Reader subscribes to the publisher
    let (status, _) = send(
        &app,
        "PUT",
        "/api/subscriptions",
        Some(&reader),
        Some(json!({ "publisher_ids": [publisher_id], "journalist_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Nothing in the reader's list until approval
    let (status, list) = send(&app, "GET", "/api/articles", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 0);

    // The journalist cannot approve their own story
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/articles/{article_id}/approve"),
        Some(&journo),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The editor can
    let (status, approved) = send(
        &app,
        "POST",
        &format!("/api/articles/{article_id}/approve"),
        Some(&editor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "approve failed: {approved}");
    assert_eq!(approved["is_approved"], true);
    assert!(approved["approved_at"].as_str().is_some());

    // Approving twice conflicts
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/articles/{article_id}/approve"),
        Some(&editor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Now the reader sees it, and so does the public home feed
    let (_, list) = send(&app, "GET", "/api/articles", Some(&reader), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["journalist_name"], "journo");

    let (status, home) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn error_status_mapping() {
    let app = app();

    // Validation error -> 400
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "ok_name",
            "email": "not-an-email",
            "password": "testpass123",
            "role": "reader",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));

    // Duplicate username -> 409
    register(&app, "taken", "reader").await;
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "taken",
            "email": "taken@example.com",
            "password": "testpass123",
            "role": "reader",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Missing token -> 401
    let (status, _) = send(&app, "GET", "/api/articles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Bad token -> 401
    let (status, _) = send(&app, "GET", "/api/articles", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown article -> 404
    let token = register(&app, "viewer", "editor").await;
    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/articles/{missing}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
