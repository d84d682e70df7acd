//! HTTP API for the dashboard: accounts, bot provisioning, settings and admin tools.
//!
//! Every response is a JSON envelope with a `success` flag. Failures carry an
//! `error` string and a 4xx/5xx status.

mod admin;
mod auth;
mod bots;
mod settings;


pub use auth::hash_password;

use crate::sessions::SessionRegistry;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use selina_core::{config::Config, error::SelinaError};
use selina_store::Store;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Maximum accepted request body.
const BODY_LIMIT: usize = 64 * 1024;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    store: Store,
    sessions: Arc<SessionRegistry>,
    config: Arc<Config>,
    uptime: Instant,
}

impl ApiState {
    pub fn new(store: Store, sessions: Arc<SessionRegistry>, config: Arc<Config>) -> Self {
        Self {
            store,
            sessions,
            config,
            uptime: Instant::now(),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
}

/// Store and other unexpected failures.
fn internal(e: SelinaError) -> ApiError {
    error!("API request failed: {e}");
    fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Unwrap a JSON body, turning syntax/type errors into a 400.
fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| fail(StatusCode::BAD_REQUEST, format!("invalid request: {e}")))
}

/// Non-empty trimmed field, or `None`.
fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Constant-time string comparison for credential checks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": format!("{} is running! 👑", state.config.selina.name),
        "timestamp": chrono::Utc::now(),
        "uptime": state.uptime.elapsed().as_secs(),
        "sessions": state.sessions.session_count(),
    }))
}

async fn ping() -> &'static str {
    "pong"
}

async fn info(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "name": format!("{} Bot API", state.config.selina.name),
        "version": state.config.bot.version,
        "developer": state.config.bot.owner_name,
        "contact": state.config.bot.owner_contact,
        "status": "online",
    }))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/api", get(info))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me/{user_id}", get(auth::me))
        .route("/api/bots/create", post(bots::create))
        .route("/api/bots/user/{user_id}", get(bots::list_for_user))
        .route("/api/bots/qr/{bot_id}", get(bots::qr))
        .route("/api/bots/pairing-code", post(bots::pairing_code))
        .route("/api/bots/status/{bot_id}", get(bots::status))
        .route("/api/bots/setup-info/{bot_id}", get(bots::setup_info))
        .route("/api/bots/{bot_id}", delete(bots::remove))
        .route(
            "/api/settings/{bot_id}",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/api/admin/users", post(admin::users))
        .route("/api/admin/bots", post(admin::bots))
        .route("/api/admin/broadcast", post(admin::broadcast))
        .route("/api/admin/stats", post(admin::stats))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Run the API server until `shutdown` resolves.
pub async fn serve(
    state: ApiState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.api.host, state.config.api.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("API server failed to bind to {addr}: {e}"))?;
    info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
