use super::{body, fail, internal, required, ApiResult, ApiState};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use selina_core::{error::SelinaError, models::User};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub(super) struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, SelinaError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| SelinaError::Validation(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored PHC string. Malformed hashes never verify.
pub(super) fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// The user record as exposed over the API: no password hash.
pub(super) fn public_user(user: &User) -> Value {
    let mut value = serde_json::to_value(user).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.remove("passwordHash");
    }
    value
}

pub(super) async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let creds = body(payload)?;
    let (Some(email), Some(password)) = (required(&creds.email), creds.password.as_deref())
    else {
        return Err(fail(StatusCode::BAD_REQUEST, "Email and password required"));
    };
    if password.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Email and password required"));
    }
    let email = email.to_lowercase();
    if !valid_email(&email) {
        return Err(fail(StatusCode::BAD_REQUEST, "Invalid email address"));
    }

    if state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(fail(StatusCode::BAD_REQUEST, "Email already registered"));
    }

    let hash = hash_password(password).map_err(internal)?;
    let user = state
        .store
        .insert_user(&User::new(&email, hash))
        .await
        .map_err(internal)?;
    info!("user registered: {}", user.email);

    Ok(Json(json!({
        "success": true,
        "user": public_user(&user),
        "message": "🎉 Registration successful! You get 1 FREE bot!",
    })))
}

pub(super) async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let creds = body(payload)?;
    let (Some(email), Some(password)) = (required(&creds.email), creds.password.as_deref())
    else {
        return Err(fail(StatusCode::BAD_REQUEST, "Email and password required"));
    };

    let user = state
        .store
        .find_user_by_email(&email.to_lowercase())
        .await
        .map_err(internal)?;
    let Some(user) = user.filter(|u| verify_password(password, &u.password_hash)) else {
        return Err(fail(StatusCode::UNAUTHORIZED, "Invalid email or password"));
    };

    Ok(Json(json!({
        "success": true,
        "user": public_user(&user),
        "token": BASE64.encode(&user.id),
    })))
}

pub(super) async fn me(State(state): State<ApiState>, Path(user_id): Path<String>) -> ApiResult {
    let user = state.store.get_user(&user_id).await.map_err(internal)?;
    let Some(user) = user else {
        return Err(fail(StatusCode::NOT_FOUND, "User not found"));
    };
    Ok(Json(json!({ "success": true, "user": public_user(&user) })))
}
