//! Admin endpoints. Credentials travel in the POST body and are checked
//! against `[admin]` in the config on every call.

use super::auth::{public_user, verify_password};
use super::{body, constant_time_eq, fail, internal, required, ApiError, ApiResult, ApiState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use selina_core::models::BotStatus;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(super) struct AdminRequest {
    email: Option<String>,
    password: Option<String>,
    message: Option<String>,
}

fn check_admin(state: &ApiState, req: &AdminRequest) -> Result<(), ApiError> {
    let admin = &state.config.admin;
    if !admin.is_configured() {
        warn!("admin request rejected: no admin credentials configured");
        return Err(fail(StatusCode::FORBIDDEN, "Unauthorized"));
    }

    let email = req.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = req.password.as_deref().unwrap_or("");
    let email_ok = constant_time_eq(&email, &admin.email.trim().to_lowercase());
    let password_ok = verify_password(password, &admin.password_hash);
    if email_ok && password_ok {
        Ok(())
    } else {
        warn!("admin request rejected: bad credentials");
        Err(fail(StatusCode::FORBIDDEN, "Unauthorized"))
    }
}

fn admin_body(
    state: &ApiState,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> Result<AdminRequest, ApiError> {
    let req = body(payload).map_err(|_| fail(StatusCode::FORBIDDEN, "Unauthorized"))?;
    check_admin(state, &req)?;
    Ok(req)
}

pub(super) async fn users(
    State(state): State<ApiState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> ApiResult {
    admin_body(&state, payload)?;
    let users: Vec<Value> = state
        .store
        .list_users()
        .await
        .map_err(internal)?
        .iter()
        .map(public_user)
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}

pub(super) async fn bots(
    State(state): State<ApiState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> ApiResult {
    admin_body(&state, payload)?;
    let bots = state.store.list_bots().await.map_err(internal)?;
    Ok(Json(json!({ "success": true, "bots": bots })))
}

pub(super) async fn broadcast(
    State(state): State<ApiState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> ApiResult {
    let req = admin_body(&state, payload)?;
    let Some(message) = required(&req.message) else {
        return Err(fail(StatusCode::BAD_REQUEST, "Message required"));
    };

    info!("admin broadcast started");
    let entry = state
        .sessions
        .broadcast_to_active(message)
        .await
        .map_err(internal)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Broadcast sent to {} users", entry.sent_to),
        "broadcast": entry,
    })))
}

pub(super) async fn stats(
    State(state): State<ApiState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> ApiResult {
    admin_body(&state, payload)?;
    let users = state.store.list_users().await.map_err(internal)?;
    let bots = state.store.list_bots().await.map_err(internal)?;
    let broadcasts = state.store.list_broadcasts().await.map_err(internal)?;

    let active = bots.iter().filter(|b| b.status == BotStatus::Active).count();
    let free = bots.iter().filter(|b| b.is_free).count();
    Ok(Json(json!({
        "success": true,
        "stats": {
            "totalUsers": users.len(),
            "totalBots": bots.len(),
            "activeBots": active,
            "freeBots": free,
            "paidBots": bots.len() - free,
            "totalBroadcasts": broadcasts.len(),
            "liveSessions": state.sessions.session_count(),
        },
    })))
}
