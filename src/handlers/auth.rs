use axum::{Json, extract::State};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, find_user, hash_password, issue_token, verify_password},
    collections::USERS,
    error::{ApiError, ApiResult},
    models::{ChangePasswordRequest, LoginRequest, MessageResponse, TokenResponse, UserProfile},
    repository::Filter,
};

/// login
///
/// [Public Route] Exchanges a username and password for a bearer token. Unknown
/// users and wrong passwords get the same answer.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let rejected = || ApiError::Unauthorized("Incorrect username or password".to_string());

    let user = find_user(&state.repo, &Filter::new().eq("username", payload.username.as_str()))
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&payload.password, &user.password_hash) {
        tracing::info!(username = %payload.username, "login rejected");
        return Err(rejected());
    }

    let access_token = issue_token(&user, &state.config)?;
    tracing::info!(user_id = %user.id, "login succeeded");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// get_me
///
/// [Authenticated Route] The profile behind the current token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserProfile>> {
    let user = find_user(&state.repo, &Filter::by_id(&id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;
    Ok(Json(user.into()))
}

/// change_password
///
/// [Authenticated Route] Replaces the caller's password after checking the
/// current one.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new password")
    )
)]
pub async fn change_password(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;

    let user = find_user(&state.repo, &Filter::by_id(&id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let mut patch = Map::new();
    patch.insert(
        "password_hash".to_string(),
        Value::String(hash_password(&payload.new_password)?),
    );
    state.repo.update(USERS, &Filter::by_id(&id), patch).await?;

    tracing::info!(user_id = %id, "password changed");
    Ok(Json(MessageResponse::new("Password updated")))
}
