//! Process settings read from the environment (after `dotenvy` has loaded `.env`).

use crate::error::ConfigError;
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use std::str::FromStr;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://127.0.0.1",
    "http://localhost:5500",
    "http://127.0.0.1:5500",
    "http://localhost:5501",
    "http://127.0.0.1:5501",
    "http://localhost:5502",
    "http://127.0.0.1:5502",
    "http://localhost:5503",
    "http://127.0.0.1:5503",
    "http://localhost:5504",
    "http://127.0.0.1:5504",
    "http://localhost:5505",
    "http://127.0.0.1:5505",
];

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Catalog schema the resolver inspects (`information_schema.*.table_schema`).
    pub db_schema: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub jwt: JwtSettings,
}

#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: SecretString,
    pub algorithm: Algorithm,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: i64,
}

impl JwtSettings {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        let jwt = JwtSettings {
            secret: SecretString::from(secret.to_string()),
            algorithm: Algorithm::HS256,
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
            leeway_secs: 30,
        };
        jwt.validate(secret)?;
        Ok(jwt)
    }

    fn validate(&self, raw_secret: &str) -> Result<(), ConfigError> {
        if raw_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if !matches!(self.algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::Invalid {
                key: "JWT_ALGORITHM",
                reason: format!("{:?} needs a key pair; only HS256/HS384/HS512 are supported", self.algorithm),
            });
        }
        if self.access_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_TTL_SECS",
                reason: "must be positive".into(),
            });
        }
        if self.access_ttl_secs >= self.refresh_ttl_secs {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_TTL_SECS",
                reason: format!(
                    "must be longer than the access TTL ({}s), got {}s",
                    self.access_ttl_secs, self.refresh_ttl_secs
                ),
            });
        }
        if self.leeway_secs < 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_LEEWAY_SECS",
                reason: "must not be negative".into(),
            });
        }
        Ok(())
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let algorithm = match get("JWT_ALGORITHM") {
            Some(s) => Algorithm::from_str(&s.to_uppercase()).map_err(|_| ConfigError::Invalid {
                key: "JWT_ALGORITHM",
                reason: format!("unknown algorithm '{}'", s),
            })?,
            None => Algorithm::HS256,
        };
        let jwt = JwtSettings {
            secret: SecretString::from(secret.clone()),
            algorithm,
            access_ttl_secs: parse_or(&get, "ACCESS_TOKEN_TTL_SECS", 900)?,
            refresh_ttl_secs: parse_or(&get, "REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600)?,
            leeway_secs: parse_or(&get, "JWT_LEEWAY_SECS", 30)?,
        };
        jwt.validate(&secret)?;

        let cors_origins = match get("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/foodco".into()),
            db_schema: get("DB_SCHEMA").unwrap_or_else(|| "public".into()),
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8001".into()),
            cors_origins,
            jwt,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = Settings::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(s.db_schema, "public");
        assert_eq!(s.bind_addr, "0.0.0.0:8001");
        assert_eq!(s.jwt.algorithm, Algorithm::HS256);
        assert!(s.jwt.access_ttl_secs < s.jwt.refresh_ttl_secs);
        assert!(s.cors_origins.iter().any(|o| o == "http://127.0.0.1:5500"));
    }

    #[test]
    fn secret_is_required() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn access_ttl_must_be_shorter_than_refresh() {
        let err = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("ACCESS_TOKEN_TTL_SECS", "3600"),
            ("REFRESH_TOKEN_TTL_SECS", "3600"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REFRESH_TOKEN_TTL_SECS", .. }));
    }

    #[test]
    fn asymmetric_algorithms_are_rejected() {
        let err = Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("JWT_ALGORITHM", "rs256")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JWT_ALGORITHM", .. }));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let s = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("CORS_ORIGINS", "http://a.test, http://b.test ,"),
        ]))
        .unwrap();
        assert_eq!(s.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
