//! FoodCo inventory backend: schema-tolerant CRUD over PostgreSQL with JWT sessions.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use auth::{TokenKind, TokenManager, TokenPair};
pub use error::{AppError, AuthError, ConfigError, SchemaError};
pub use routes::app_router;
pub use schema::{PgCatalog, SchemaCatalog, SchemaResolver};
pub use settings::Settings;
pub use state::AppState;
