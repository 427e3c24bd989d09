//! Raw material and finished goods handlers.

use crate::error::AppError;
use crate::handlers::parse_id;
use crate::response::{created, success_many, success_one};
use crate::service::{FinishedGoodsBody, RawMaterialBody, StockInput, StockKind, StockService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

async fn list(state: &AppState, kind: StockKind) -> Result<impl IntoResponse, AppError> {
    let rows = StockService::list(&state.resolver(), &state.pool, kind).await?;
    Ok(success_many(rows))
}

async fn read(state: &AppState, kind: StockKind, id: &str) -> Result<impl IntoResponse, AppError> {
    let row = StockService::read(&state.resolver(), &state.pool, kind, parse_id(id)?).await?;
    Ok(success_one(row))
}

async fn create(state: &AppState, kind: StockKind, input: StockInput) -> Result<impl IntoResponse, AppError> {
    let id = StockService::create(&state.resolver(), &state.pool, kind, &input).await?;
    tracing::info!(id, ?kind, "stock item created");
    Ok(created(json!({ "id": id })))
}

async fn update(state: &AppState, kind: StockKind, id: &str, input: StockInput) -> Result<impl IntoResponse, AppError> {
    StockService::update(&state.resolver(), &state.pool, kind, parse_id(id)?, &input).await?;
    Ok(success_one(json!({ "updated": true })))
}

async fn delete(state: &AppState, kind: StockKind, id: &str) -> Result<impl IntoResponse, AppError> {
    StockService::delete(&state.resolver(), &state.pool, kind, parse_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_raw(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list(&state, StockKind::Raw).await
}

pub async fn read_raw(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    read(&state, StockKind::Raw, &id).await
}

pub async fn create_raw(
    State(state): State<AppState>,
    Json(body): Json<RawMaterialBody>,
) -> Result<impl IntoResponse, AppError> {
    create(&state, StockKind::Raw, body.into()).await
}

pub async fn update_raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RawMaterialBody>,
) -> Result<impl IntoResponse, AppError> {
    update(&state, StockKind::Raw, &id, body.into()).await
}

pub async fn delete_raw(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    delete(&state, StockKind::Raw, &id).await
}

pub async fn list_finished(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list(&state, StockKind::Finished).await
}

pub async fn read_finished(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    read(&state, StockKind::Finished, &id).await
}

pub async fn create_finished(
    State(state): State<AppState>,
    Json(body): Json<FinishedGoodsBody>,
) -> Result<impl IntoResponse, AppError> {
    create(&state, StockKind::Finished, body.into()).await
}

pub async fn update_finished(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FinishedGoodsBody>,
) -> Result<impl IntoResponse, AppError> {
    update(&state, StockKind::Finished, &id, body.into()).await
}

pub async fn delete_finished(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    delete(&state, StockKind::Finished, &id).await
}
