//! Typed statement parameters and their sqlx bindings.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    /// Rendered as a literal `NULL`, never bound, so it fits any column type.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(chrono::NaiveDate),
    /// Text bound to an enumerated column; rendered as `$n::<cast>`.
    Enum { value: String, cast: String },
}

impl SqlParam {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => n.as_f64().map(SqlParam::Float).unwrap_or(SqlParam::Null),
            },
            Value::String(s) => SqlParam::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlParam::Text(v.to_string()),
        }
    }

    /// Text for a plain column, or a cast enum literal when the column is enumerated.
    pub fn text_for(value: impl Into<String>, cast: Option<&str>) -> Self {
        match cast {
            Some(cast) => SqlParam::Enum {
                value: value.into(),
                cast: cast.to_string(),
            },
            None => SqlParam::Text(value.into()),
        }
    }

    pub(crate) fn cast(&self) -> Option<&str> {
        match self {
            SqlParam::Enum { cast, .. } => Some(cast),
            _ => None,
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<chrono::NaiveDate> for SqlParam {
    fn from(v: chrono::NaiveDate) -> Self {
        SqlParam::Date(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlParam::Null)
    }
}

/// Bind every parameter in placeholder order.
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            // not reachable through QueryBuf, which renders NULL inline
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(b) => query.bind(*b),
            SqlParam::Int(n) => query.bind(*n),
            SqlParam::Float(f) => query.bind(*f),
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Date(d) => query.bind(*d),
            SqlParam::Enum { value, .. } => query.bind(value.as_str()),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_prefer_integers() {
        assert_eq!(SqlParam::from_json(&json!(7)), SqlParam::Int(7));
        assert_eq!(SqlParam::from_json(&json!(2.5)), SqlParam::Float(2.5));
        assert_eq!(SqlParam::from_json(&json!(null)), SqlParam::Null);
    }

    #[test]
    fn options_collapse_to_null() {
        assert_eq!(SqlParam::from(None::<i64>), SqlParam::Null);
        assert_eq!(SqlParam::from(Some("x")), SqlParam::Text("x".into()));
    }

    #[test]
    fn text_for_enum_columns_carries_cast() {
        let p = SqlParam::text_for("RawMaterial", Some("\"public\".\"item_type\""));
        assert_eq!(p.cast(), Some("\"public\".\"item_type\""));
        assert_eq!(SqlParam::text_for("x", None), SqlParam::Text("x".into()));
    }
}
