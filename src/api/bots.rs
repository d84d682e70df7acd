use super::{body, fail, internal, required, ApiResult, ApiState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use selina_core::models::BotRecord;
use selina_store::BotSlot;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

const INVALID_PHONE: &str =
    "Invalid phone number format. Use country code + number (e.g., 94768738555)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateBotRequest {
    user_id: Option<String>,
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PairingCodeRequest {
    bot_id: Option<String>,
    phone_number: Option<String>,
}

/// Country code + number, 10 to 15 digits. Spaces, dashes and a leading `+` are dropped.
pub(super) fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(digits)
}

pub(super) async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<CreateBotRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let (Some(user_id), Some(phone)) = (required(&req.user_id), required(&req.phone_number))
    else {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "User ID and phone number required",
        ));
    };
    let Some(phone) = normalize_phone(phone) else {
        return Err(fail(StatusCode::BAD_REQUEST, INVALID_PHONE));
    };

    let limit = state.config.limits.max_bots_per_user;
    let slot = state
        .store
        .reserve_bot_slot(user_id, limit)
        .await
        .map_err(internal)?;
    let is_free = match slot {
        BotSlot::Reserved { is_free } => is_free,
        BotSlot::LimitReached => {
            return Err(fail(
                StatusCode::BAD_REQUEST,
                format!("Maximum bot limit ({limit}) reached"),
            ))
        }
        BotSlot::UnknownUser => return Err(fail(StatusCode::NOT_FOUND, "User not found")),
    };

    let bot = BotRecord::new(
        user_id,
        &phone,
        is_free,
        state.config.limits.bot_lifetime_days,
    );
    if let Err(e) = state.store.insert_bot(&bot).await {
        if let Err(e) = state.store.record_bot_deleted(user_id).await {
            warn!("failed to release bot slot for {user_id}: {e}");
        }
        return Err(internal(e));
    }
    info!("bot {} created for user {user_id} ({phone})", bot.id);

    state.sessions.spawn_session(&bot.id, &phone).await;
    // A delete racing this request removes the record before stopping the
    // session, so a missing record here means the session must go too.
    if state.store.get_bot(&bot.id).await.map_err(internal)?.is_none() {
        state.sessions.stop_session(&bot.id).await;
    }

    let message = if is_free {
        "🎉 Free bot created! Open setup URL to connect."
    } else {
        "Bot created successfully! Open setup URL to connect."
    };
    Ok(Json(json!({
        "success": true,
        "setupUrl": state.config.api.setup_url(&bot.id),
        "bot": bot,
        "message": message,
    })))
}

pub(super) async fn list_for_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult {
    let bots = state.store.bots_for_user(&user_id).await.map_err(internal)?;
    Ok(Json(json!({ "success": true, "bots": bots })))
}

pub(super) async fn qr(State(state): State<ApiState>, Path(bot_id): Path<String>) -> ApiResult {
    match state.sessions.get_qr(&bot_id) {
        Some(qr) => Ok(Json(json!({ "success": true, "qrCode": qr }))),
        None => Err(fail(
            StatusCode::NOT_FOUND,
            "QR code not ready yet. Please wait...",
        )),
    }
}

pub(super) async fn pairing_code(
    State(state): State<ApiState>,
    payload: Result<Json<PairingCodeRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let (Some(bot_id), Some(phone)) = (required(&req.bot_id), required(&req.phone_number)) else {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "Bot ID and phone number required",
        ));
    };
    let Some(phone) = normalize_phone(phone) else {
        return Err(fail(StatusCode::BAD_REQUEST, INVALID_PHONE));
    };

    info!("[{bot_id}] pairing code requested for {phone}");
    match state.sessions.request_pairing_code(bot_id, &phone).await {
        Some(code) => Ok(Json(json!({
            "success": true,
            "pairingCode": code,
            "message": "Pairing code generated successfully",
        }))),
        None => Err(fail(
            StatusCode::BAD_REQUEST,
            "Could not generate pairing code. Please ensure bot is initializing and try again in a few seconds.",
        )),
    }
}

pub(super) async fn remove(State(state): State<ApiState>, Path(bot_id): Path<String>) -> ApiResult {
    let Some(bot) = state.store.get_bot(&bot_id).await.map_err(internal)? else {
        return Err(fail(StatusCode::NOT_FOUND, "Bot not found"));
    };

    state.store.delete_bot(&bot_id).await.map_err(internal)?;
    state.sessions.stop_session(&bot_id).await;
    state
        .store
        .delete_settings(&bot_id)
        .await
        .map_err(internal)?;
    state
        .store
        .record_bot_deleted(&bot.user_id)
        .await
        .map_err(internal)?;
    info!("[{bot_id}] bot deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Bot deleted successfully",
    })))
}

pub(super) async fn status(State(state): State<ApiState>, Path(bot_id): Path<String>) -> ApiResult {
    let bot = state.store.get_bot(&bot_id).await.map_err(internal)?;
    Ok(Json(json!({
        "success": true,
        "status": state.sessions.get_status(&bot_id),
        "pairingCode": state.sessions.get_pairing_code(&bot_id),
        "bot": bot,
    })))
}

pub(super) async fn setup_info(
    State(state): State<ApiState>,
    Path(bot_id): Path<String>,
) -> ApiResult {
    let Some(bot) = state.store.get_bot(&bot_id).await.map_err(internal)? else {
        return Err(fail(StatusCode::NOT_FOUND, "Bot not found"));
    };
    Ok(Json(json!({
        "success": true,
        "setupUrl": state.config.api.setup_url(&bot.id),
        "bot": bot,
    })))
}

#[cfg(test)]
mod tests {
    use super::normalize_phone;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("94768738555").as_deref(), Some("94768738555"));
        assert_eq!(normalize_phone("+94 76-873-8555").as_deref(), Some("94768738555"));
        assert_eq!(normalize_phone("123456789"), None);
        assert_eq!(normalize_phone("1234567890123456"), None);
        assert_eq!(normalize_phone("9476873855x"), None);
        assert_eq!(normalize_phone(""), None);
    }
}
