//! Router assembly and HTTP layers.

mod auth;
mod common;
mod inventory;

pub use auth::auth_routes;
pub use common::common_routes;
pub use inventory::inventory_routes;

use crate::settings::Settings;
use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Configured origins with credentials. Methods and headers are listed explicitly,
/// since wildcards cannot be combined with credentials.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    tracing::info!(origins = ?settings.cors_origins, "CORS origins");
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

/// Every route with CORS, body limit and request tracing.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings);
    Router::new()
        .merge(common_routes())
        .merge(inventory_routes())
        .merge(auth_routes())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
