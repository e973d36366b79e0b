use std::sync::LazyLock;

use axum::{Json, extract::State, response::IntoResponse};
use regex::Regex;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::current_user,
    models::user::{MeResponse, SetUsernameRequest, SetUsernameResponse},
    state::SharedStore,
    store::StoreError,
    utils::jwt::Claims,
};

/// Lowercase letters, digits, underscore or dash; 3-20 characters.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{3,20}$").expect("username pattern is valid"));

/// Get current user's profile.
pub async fn get_me(
    State(store): State<SharedStore>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(store.as_ref(), &claims).await?;
    Ok(Json(MeResponse::from(user)))
}

/// Choose a username (nickname).
/// The name is trimmed and lowercased before validation.
pub async fn set_username(
    State(store): State<SharedStore>,
    claims: Claims,
    Json(payload): Json<SetUsernameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = current_user(store.as_ref(), &claims).await?;

    let username = payload.username.trim().to_lowercase();
    if !USERNAME_RE.is_match(&username) {
        return Err(AppError::BadRequest(
            "Username must be 3-20 characters, alphanumeric, underscore or dash only".to_string(),
        ));
    }

    let updated = store
        .set_username(user.id, &username)
        .await
        .map_err(|e| match e {
            StoreError::Conflict => AppError::Conflict("Username already taken".to_string()),
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = updated.id, username = %username, "Username set");

    Ok(Json(SetUsernameResponse {
        success: true,
        username,
    }))
}
