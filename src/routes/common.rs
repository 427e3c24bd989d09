//! Common routes: banner, health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

#[derive(Serialize)]
struct ApiHealthBody {
    ok: bool,
    db: String,
    time: String,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "FoodCo Unified API",
        "apis": [
            "/api/raw-materials", "/api/finished-goods", "/api/inventory",
            "/api/transactions", "/api/inventory_transactions",
            "/api/users", "/api/auth/login", "/api/auth/refresh", "/api/auth/logout", "/api/me"
        ]
    }))
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    if sqlx::query("SELECT 1").fetch_optional(&state.pool).await.is_err() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: Some("ok"),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness with the schema name; does not touch the database.
async fn api_health(State(state): State<AppState>) -> Json<ApiHealthBody> {
    Json(ApiHealthBody {
        ok: true,
        db: state.settings.db_schema.clone(),
        time: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /, /health, /ready, /version, /api/health, /api/tx/health.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/api/health", get(api_health))
        .route("/api/tx/health", get(api_health))
}
