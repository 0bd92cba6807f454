use crate::domain::{ArticleView, NewsletterView, Publisher, UserProfile};
use crate::error::{NewsError, Result};
use crate::service::{
    ArticleDraft, AuthResponse, Dashboard, LoginRequest, NewsService, NewsletterDraft,
    PublisherDraft, RegisterRequest, StaffAction, SubscriptionUpdate, DEFAULT_FEED_LIMIT,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NewsService>,
}

/// JSON error envelope with a status code mapped from the error kind
pub struct ApiError(NewsError);

impl From<NewsError> for ApiError {
    fn from(e: NewsError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NewsError::Validation(_) => StatusCode::BAD_REQUEST,
            NewsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            NewsError::Forbidden(_) => StatusCode::FORBIDDEN,
            NewsError::NotFound(_) => StatusCode::NOT_FOUND,
            NewsError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| NewsError::Unauthorized("missing bearer token".to_string()))
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<crate::domain::User> {
    state.service.authenticate(bearer_token(headers)?).await
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "newsroom",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ----- auth -----

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.service.register(req).await?))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.service.login(req).await?))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<serde_json::Value>> {
    let token = bearer_token(&headers)?;
    state.service.logout(token).await?;
    Ok(Json(serde_json::json!({ "status": "logged out" })))
}

// ----- public content -----

async fn home(State(state): State<AppState>) -> ApiResult<Json<Vec<ArticleView>>> {
    Ok(Json(state.service.home_feed(DEFAULT_FEED_LIMIT).await?))
}

// ----- dashboard -----

async fn feed(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Dashboard>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.dashboard(&user).await?))
}

// ----- articles -----

async fn list_articles(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ArticleView>>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.list_articles(&user).await?))
}

async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ArticleDraft>,
) -> ApiResult<(StatusCode, Json<ArticleView>)> {
    let user = require_user(&state, &headers).await?;
    let view = state.service.create_article(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ArticleView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.get_article(&user, id).await?))
}

async fn update_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(draft): Json<ArticleDraft>,
) -> ApiResult<Json<ArticleView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.update_article(&user, id, draft).await?))
}

async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers).await?;
    state.service.delete_article(&user, id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

async fn approve_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ArticleView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.approve_article(&user, id).await?))
}

// ----- newsletters -----

async fn list_newsletters(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<NewsletterView>>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.list_newsletters(&user).await?))
}

async fn create_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<NewsletterDraft>,
) -> ApiResult<(StatusCode, Json<NewsletterView>)> {
    let user = require_user(&state, &headers).await?;
    let view = state.service.create_newsletter(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NewsletterView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.get_newsletter(&user, id).await?))
}

async fn update_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(draft): Json<NewsletterDraft>,
) -> ApiResult<Json<NewsletterView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(
        state.service.update_newsletter(&user, id, draft).await?,
    ))
}

async fn delete_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = require_user(&state, &headers).await?;
    state.service.delete_newsletter(&user, id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

async fn publish_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NewsletterView>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.publish_newsletter(&user, id).await?))
}

// ----- publishers -----

async fn list_publishers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Publisher>>> {
    require_user(&state, &headers).await?;
    Ok(Json(state.service.list_publishers().await?))
}

async fn create_publisher(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<PublisherDraft>,
) -> ApiResult<(StatusCode, Json<Publisher>)> {
    let user = require_user(&state, &headers).await?;
    let publisher = state.service.register_publisher(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(publisher)))
}

async fn get_publisher(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Publisher>> {
    require_user(&state, &headers).await?;
    Ok(Json(state.service.get_publisher(id).await?))
}

async fn join_publisher(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Publisher>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.join_publisher(&user, id).await?))
}

async fn manage_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(action): Json<StaffAction>,
) -> ApiResult<Json<Publisher>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.manage_staff(&user, id, action).await?))
}

// ----- subscriptions -----

async fn get_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SubscriptionUpdate>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.get_subscriptions(&user).await?))
}

async fn set_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<SubscriptionUpdate>,
) -> ApiResult<Json<SubscriptionUpdate>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(state.service.set_subscriptions(&user, update).await?))
}

async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<UserProfile>> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(user.profile()))
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/", get(home))
        .route("/articles/latest", get(home))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/api/me", get(whoami))
        .route("/api/feed", get(feed))
        .route("/api/articles", get(list_articles).post(create_article))
        .route(
            "/api/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/api/articles/:id/approve", post(approve_article))
        .route(
            "/api/newsletters",
            get(list_newsletters).post(create_newsletter),
        )
        .route(
            "/api/newsletters/:id",
            get(get_newsletter)
                .put(update_newsletter)
                .delete(delete_newsletter),
        )
        .route("/api/newsletters/:id/publish", post(publish_newsletter))
        .route(
            "/api/publishers",
            get(list_publishers).post(create_publisher),
        )
        .route("/api/publishers/:id", get(get_publisher))
        .route("/api/publishers/:id/join", post(join_publisher))
        .route("/api/publishers/:id/staff", post(manage_staff))
        .route("/api/subscriptions", put(set_subscriptions).get(get_subscriptions))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    service: Arc<NewsService>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app = create_router(AppState { service });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📰 REST API:     http://localhost:{port}/api");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
