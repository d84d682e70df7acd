use super::{body, internal, ApiResult, ApiState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use selina_core::models::SettingsPatch;
use serde_json::json;
use tracing::info;

pub(super) async fn get_settings(
    State(state): State<ApiState>,
    Path(bot_id): Path<String>,
) -> ApiResult {
    let settings = state.store.settings_for(&bot_id).await.map_err(internal)?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

pub(super) async fn put_settings(
    State(state): State<ApiState>,
    Path(bot_id): Path<String>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> ApiResult {
    let patch = body(payload)?;
    let settings = state
        .store
        .update_settings(&bot_id, &patch)
        .await
        .map_err(internal)?;
    info!("[{bot_id}] settings updated");
    Ok(Json(json!({ "success": true, "settings": settings })))
}
