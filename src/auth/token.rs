//! Access/refresh token issuance, verification, rotation and revocation.

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::revocation::{InMemoryRevocations, RevocationStore};
use crate::error::AuthError;
use crate::settings::JwtSettings;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Claim names owned by the manager; callers cannot override them through extra claims.
const RESERVED_CLAIMS: &[&str] = &["sub", "jti", "iat", "exp", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub jti: String,
}

/// Wire shape returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub token_type: String,
    pub access_token: String,
    pub access_expires_at: i64,
    pub refresh_token: String,
    pub refresh_expires_at: i64,
}

pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    leeway_secs: i64,
    clock: Arc<dyn Clock>,
    revoked: Arc<dyn RevocationStore>,
}

impl TokenManager {
    pub fn new(jwt: &JwtSettings) -> Self {
        let secret = jwt.secret.expose_secret().as_bytes();
        TokenManager {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm: jwt.algorithm,
            access_ttl_secs: jwt.access_ttl_secs,
            refresh_ttl_secs: jwt.refresh_ttl_secs,
            leeway_secs: jwt.leeway_secs,
            clock: Arc::new(SystemClock),
            revoked: Arc::new(InMemoryRevocations::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_revocation_store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.revoked = store;
        self
    }

    fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    pub fn issue(&self, subject: &str, kind: TokenKind, extra: Map<String, Value>) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now_epoch_secs();
        let jti = uuid::Uuid::new_v4().simple().to_string();
        let mut extra = extra;
        extra.retain(|k, _| !RESERVED_CLAIMS.contains(&k.as_str()));
        let claims = Claims {
            sub: subject.to_string(),
            jti: jti.clone(),
            iat: now,
            exp: now + self.ttl(kind),
            kind,
            extra,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            jti,
        })
    }

    pub fn issue_pair(&self, subject: &str, extra: Map<String, Value>) -> Result<TokenPair, AuthError> {
        let access = self.issue(subject, TokenKind::Access, extra.clone())?;
        let refresh = self.issue(subject, TokenKind::Refresh, extra)?;
        Ok(TokenPair {
            token_type: "bearer".into(),
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Signature and expiry only; kind and revocation are checked by `verify`.
    fn decode_checked(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed(e.to_string()),
        })?;

        let now = self.clock.now_epoch_secs();
        if data.claims.exp < now - self.leeway_secs {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.decode_checked(token)?;
        if claims.kind != expected {
            return Err(AuthError::WrongKind {
                expected: expected.as_str(),
                actual: claims.kind.as_str(),
            });
        }
        if self.revoked.is_revoked(&claims.jti) {
            return Err(AuthError::Revoked);
        }
        Ok(claims)
    }

    /// Revoke by id alone. The id is retained for the longest lifetime any token can have.
    pub fn revoke(&self, jti: &str) {
        let now = self.clock.now_epoch_secs();
        self.revoke_until(jti, now + self.refresh_ttl_secs);
    }

    /// Returns `false` if the id was already revoked.
    fn revoke_until(&self, jti: &str, exp: i64) -> bool {
        let now = self.clock.now_epoch_secs();
        self.revoked.purge_expired(now);
        // A token stays acceptable for `leeway` past exp, so its revocation must too.
        self.revoked.revoke(jti, exp + self.leeway_secs)
    }

    /// One-time use: the presented refresh token is revoked and a new pair issued.
    pub fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh)?;
        if !self.revoke_until(&claims.jti, claims.exp) {
            // lost a race with another rotation of the same token
            return Err(AuthError::Revoked);
        }
        tracing::info!(sub = %claims.sub, jti = %claims.jti, "refresh token rotated");
        self.issue_pair(&claims.sub, claims.extra)
    }

    /// Revoke one presented token of either kind ahead of its expiry.
    pub fn logout(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode_checked(token)?;
        self.revoke_until(&claims.jti, claims.exp);
        tracing::info!(sub = %claims.sub, jti = %claims.jti, kind = claims.kind.as_str(), "token revoked");
        Ok(claims)
    }
}
