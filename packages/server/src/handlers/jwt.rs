//! Token endpoints.
//!
//! - `POST /api/v1/jwt/create/`: `{username, password}` → `{refresh, access}`.
//! - `POST /api/v1/jwt/refresh/`: `{refresh}` → `{access}`.
//! - `POST /api/v1/jwt/verify/`: `{token}` → `{}` when the token is valid.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use yatube::{FieldErrors, ValidationError};
use yatube_api::{AccessToken, TokenObtainRequest, TokenPair, TokenRefreshRequest, TokenVerifyRequest};

use crate::{
    error::{AppError, AppJson},
    password::verify_password,
    tokens::TokenType,
};

use super::AppState;

pub const NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";

pub async fn create_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenObtainRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", req.username);
    let password = required(&mut errors, "password", req.password);
    let (Some(username), Some(password)) = (username, password) else {
        return Err(errors.into());
    };

    let Some((user, hash)) = state.storage.get_credentials(&username).await? else {
        tracing::warn!(%username, "login for unknown user");
        return Err(AppError::NotAuthenticated(NO_ACTIVE_ACCOUNT.into()));
    };
    if !verify_password(&password, &hash)? {
        tracing::warn!(%username, "login with wrong password");
        return Err(AppError::NotAuthenticated(NO_ACTIVE_ACCOUNT.into()));
    }

    tracing::info!(%username, "issued token pair");
    Ok(Json(state.tokens.issue_pair(user.id)?))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let mut errors = FieldErrors::new();
    let Some(refresh) = required(&mut errors, "refresh", req.refresh) else {
        return Err(errors.into());
    };

    let claims = state.tokens.decode_refresh(&refresh)?;
    if state.storage.get_user(claims.user_id).await?.is_none() {
        tracing::warn!(user_id = %claims.user_id, "refresh for unknown user");
        return Err(AppError::TokenInvalid("user not found".into()));
    }
    let access = state.tokens.issue(claims.user_id, TokenType::Access)?;
    Ok(Json(AccessToken { access }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenVerifyRequest>,
) -> Result<Json<Value>, AppError> {
    let mut errors = FieldErrors::new();
    let Some(token) = required(&mut errors, "token", req.token) else {
        return Err(errors.into());
    };

    state.tokens.verify(&token)?;
    Ok(Json(json!({})))
}

/// Record a missing or empty credential field.
fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        None => {
            errors.add(field, ValidationError::Required);
            None
        }
        Some(v) if v.is_empty() => {
            errors.add(field, ValidationError::Blank);
            None
        }
        Some(v) => Some(v),
    }
}
