//! Extract the bearer credential from the `Authorization` header.

use crate::auth::{Claims, TokenKind};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Raw token from `Authorization: Bearer <token>`, not yet verified.
#[derive(Clone, Debug)]
pub struct BearerToken(pub String);

fn bearer_from(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_from(parts)
            .map(BearerToken)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))
    }
}

/// Claims of a verified, unrevoked access token.
#[derive(Clone, Debug)]
pub struct AccessClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AccessClaims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.tokens.verify(&token, TokenKind::Access)?;
        Ok(AccessClaims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut b = Request::builder().uri("/api/me");
        if let Some(v) = auth {
            b = b.header(AUTHORIZATION, v);
        }
        b.body(()).unwrap().into_parts().0
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_from(&parts(Some("Bearer abc.def"))).as_deref(), Some("abc.def"));
        assert_eq!(bearer_from(&parts(Some("bearer  abc "))).as_deref(), Some("abc"));
    }

    #[test]
    fn other_schemes_and_blanks_are_ignored() {
        assert_eq!(bearer_from(&parts(Some("Basic dXNlcjpwdw=="))), None);
        assert_eq!(bearer_from(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_from(&parts(None)), None);
    }
}
