//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failures from mapping logical names onto the deployed schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("none of the tables {candidates:?} exist")]
    TableNotFound { candidates: Vec<String> },
    #[error("column(s) {keys:?} not found in table '{table}'")]
    MissingColumns { table: String, keys: Vec<String> },
    #[error("'{requested}' is not allowed; allowed={allowed:?}")]
    CategoryRejected { requested: String, allowed: Vec<String> },
}

/// Token verification and issuance failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("expected a {expected} token, got {actual}")]
    WrongKind { expected: &'static str, actual: &'static str },
    #[error("token has been revoked")]
    Revoked,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Schema(SchemaError::CategoryRejected { .. }) => {
                (StatusCode::BAD_REQUEST, "category_rejected")
            }
            AppError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            AppError::Auth(e) => match e {
                AuthError::Expired => (StatusCode::UNAUTHORIZED, "token_expired"),
                AuthError::InvalidSignature | AuthError::Malformed(_) => {
                    (StatusCode::UNAUTHORIZED, "invalid_token")
                }
                AuthError::WrongKind { .. } => (StatusCode::UNAUTHORIZED, "wrong_token_kind"),
                AuthError::Revoked => (StatusCode::UNAUTHORIZED, "token_revoked"),
                AuthError::Signing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "token_error"),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Schema(SchemaError::TableNotFound { candidates }) => {
                Some(serde_json::json!({ "candidates": candidates }))
            }
            AppError::Schema(SchemaError::MissingColumns { table, keys }) => {
                Some(serde_json::json!({ "table": table, "missing": keys }))
            }
            AppError::Schema(SchemaError::CategoryRejected { requested, allowed }) => {
                Some(serde_json::json!({ "requested": requested, "allowed": allowed }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
