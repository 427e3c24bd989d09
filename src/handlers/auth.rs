//! Login, refresh rotation, logout and the current-user lookup.

use crate::auth::verify_password;
use crate::error::AppError;
use crate::extractors::{AccessClaims, BearerToken};
use crate::response::success_one;
use crate::service::UserService;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid username/email or password".into())
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<impl IntoResponse, AppError> {
    let found = UserService::find_credentials(&state.resolver(), &state.pool, &body.identifier).await?;
    let Some(user) = found else {
        tracing::warn!(identifier = %body.identifier, "login for unknown user");
        return Err(invalid_credentials());
    };
    if !verify_password(&body.password, &user.password_hash) {
        tracing::warn!(user_id = user.user_id, "login with wrong password");
        return Err(invalid_credentials());
    }
    if user.is_active == Some(false) {
        tracing::warn!(user_id = user.user_id, "login for inactive user");
        return Err(AppError::Unauthorized("account is inactive".into()));
    }

    let mut extra = Map::new();
    extra.insert("username".into(), Value::String(user.username.clone()));
    let pair = state.tokens.issue_pair(&user.user_id.to_string(), extra)?;
    tracing::info!(user_id = user.user_id, "login");
    Ok(Json(pair))
}

/// Rotation needs no database round-trip.
pub async fn refresh(State(state): State<AppState>, Json(body): Json<RefreshBody>) -> Result<impl IntoResponse, AppError> {
    let pair = state.tokens.rotate(&body.refresh_token)?;
    Ok(Json(pair))
}

pub async fn logout(State(state): State<AppState>, BearerToken(token): BearerToken) -> Result<impl IntoResponse, AppError> {
    let claims = state.tokens.logout(&token)?;
    Ok(success_one(json!({ "revoked": claims.jti })))
}

pub async fn me(State(state): State<AppState>, AccessClaims(claims): AccessClaims) -> Result<impl IntoResponse, AppError> {
    let id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("token subject is not a user id".into()))?;
    let user = UserService::read(&state.resolver(), &state.pool, id).await?;
    Ok(success_one(user))
}
