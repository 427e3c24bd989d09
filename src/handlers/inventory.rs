use crate::error::AppError;
use crate::service::{InventoryFilter, InventoryService};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

/// GET /api/inventory: both stock tables as one list. Returned bare, as the UI expects.
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let items = InventoryService::list(&state.resolver(), &state.pool, &filter).await?;
    Ok(Json(items))
}
