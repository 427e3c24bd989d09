//! Inventory transaction handlers.

use crate::error::AppError;
use crate::handlers::parse_id;
use crate::response::{created, success_many, success_one};
use crate::service::{TransactionService, TxCreate, TxListQuery, TxUpdate};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TxListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = TransactionService::list(&state.resolver(), &state.pool, &query).await?;
    Ok(success_many(rows))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let row = TransactionService::read(&state.resolver(), &state.pool, parse_id(&id)?).await?;
    Ok(success_one(row))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<TxCreate>) -> Result<impl IntoResponse, AppError> {
    let id = TransactionService::create(&state.resolver(), &state.pool, &body).await?;
    Ok(created(json!({ "id": id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TxUpdate>,
) -> Result<impl IntoResponse, AppError> {
    TransactionService::update(&state.resolver(), &state.pool, parse_id(&id)?, &body).await?;
    Ok(success_one(json!({ "updated": true })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    TransactionService::delete(&state.resolver(), &state.pool, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
