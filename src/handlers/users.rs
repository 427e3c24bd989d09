//! User handlers.

use crate::error::AppError;
use crate::handlers::parse_id;
use crate::response::{created, success_many, success_one};
use crate::service::{UserBody, UserService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = UserService::list(&state.resolver(), &state.pool).await?;
    Ok(success_many(users))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let user = UserService::read(&state.resolver(), &state.pool, parse_id(&id)?).await?;
    Ok(success_one(user))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<UserBody>) -> Result<impl IntoResponse, AppError> {
    let user = UserService::create(&state.resolver(), &state.pool, &body).await?;
    Ok(created(user))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::update(&state.resolver(), &state.pool, parse_id(&id)?, &body).await?;
    Ok(success_one(user))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    UserService::delete(&state.resolver(), &state.pool, parse_id(&id)?).await?;
    Ok(success_one(json!({ "detail": "User deleted successfully." })))
}
