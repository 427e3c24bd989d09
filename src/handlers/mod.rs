//! HTTP handlers.

pub mod auth;
pub mod inventory;
pub mod stock;
pub mod transactions;
pub mod users;

use crate::error::AppError;

/// Path ids are integers in every table variant.
pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
    }
}
