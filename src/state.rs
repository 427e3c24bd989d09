//! Shared application state for all routes.

use crate::auth::TokenManager;
use crate::schema::{PgCatalog, SchemaResolver};
use crate::settings::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    /// One manager per process, so every handler sees the same revocation set.
    pub tokens: Arc<TokenManager>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        let tokens = Arc::new(TokenManager::new(&settings.jwt));
        AppState {
            pool,
            settings: Arc::new(settings),
            tokens,
        }
    }

    /// Resolver over the configured schema. Each call reads the catalog afresh.
    pub fn resolver(&self) -> SchemaResolver<PgCatalog> {
        SchemaResolver::new(PgCatalog::new(self.pool.clone(), self.settings.db_schema.clone()))
    }
}
