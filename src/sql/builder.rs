//! Builds parameterized SELECT, INSERT, UPDATE, DELETE over a resolved table.
//! Identifiers only ever come from the resolver; values are always parameters.

use crate::schema::TableMap;
use crate::sql::params::SqlParam;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf::default()
    }

    /// Placeholder text for `v`: `NULL` inline, otherwise `$n` (with a cast for enums).
    pub fn push_param(&mut self, v: SqlParam) -> String {
        if let SqlParam::Null = v {
            return "NULL".into();
        }
        let n = self.params.len() + 1;
        let ph = match v.cast() {
            Some(cast) => format!("${}::{}", n, cast),
            None => format!("${}", n),
        };
        self.params.push(v);
        ph
    }
}

/// One output column: physical column, response alias, optional SQL cast.
#[derive(Clone, Debug)]
pub struct Selected<'a> {
    pub column: &'a str,
    pub alias: &'a str,
    pub cast: Option<&'a str>,
}

impl<'a> Selected<'a> {
    pub fn new(column: &'a str, alias: &'a str) -> Self {
        Selected { column, alias, cast: None }
    }

    pub fn cast(column: &'a str, alias: &'a str, cast: &'a str) -> Self {
        Selected {
            column,
            alias,
            cast: Some(cast),
        }
    }
}

fn projection(cols: &[Selected<'_>]) -> String {
    cols.iter()
        .map(|s| match s.cast {
            Some(cast) => format!("{}::{} AS {}", quoted(s.column), cast, quoted(s.alias)),
            None => format!("{} AS {}", quoted(s.column), quoted(s.alias)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compare {
    Eq,
    DateOnOrAfter,
    DateOnOrBefore,
}

#[derive(Clone, Debug)]
pub struct Filter {
    pub column: String,
    pub compare: Compare,
    pub value: SqlParam,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<SqlParam>) -> Self {
        Filter {
            column: column.to_string(),
            compare: Compare::Eq,
            value: value.into(),
        }
    }

    pub fn date_from(column: &str, date: chrono::NaiveDate) -> Self {
        Filter {
            column: column.to_string(),
            compare: Compare::DateOnOrAfter,
            value: SqlParam::Date(date),
        }
    }

    pub fn date_to(column: &str, date: chrono::NaiveDate) -> Self {
        Filter {
            column: column.to_string(),
            compare: Compare::DateOnOrBefore,
            value: SqlParam::Date(date),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// SELECT with optional filters, ordered by `order_by`.
pub fn select_rows(
    table: &TableMap,
    cols: &[Selected<'_>],
    filters: &[Filter],
    order_by: &str,
    order: Order,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for f in filters {
        let col = quoted(&f.column);
        let ph = q.push_param(f.value.clone());
        where_parts.push(match f.compare {
            Compare::Eq => format!("{} = {}", col, ph),
            Compare::DateOnOrAfter => format!("CAST({} AS date) >= {}", col, ph),
            Compare::DateOnOrBefore => format!("CAST({} AS date) <= {}", col, ph),
        });
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let dir = match order {
        Order::Asc => "ASC",
        Order::Desc => "DESC",
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} {}",
        projection(cols),
        qualified_table(&table.schema, &table.table),
        where_clause,
        quoted(order_by),
        dir
    );
    q
}

/// SELECT one row by key column.
pub fn select_by_id(table: &TableMap, cols: &[Selected<'_>], id_col: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlParam::Int(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        projection(cols),
        qualified_table(&table.schema, &table.table),
        quoted(id_col),
        ph
    );
    q
}

/// INSERT the given columns, returning the new key as bigint.
pub fn insert_returning(table: &TableMap, values: Vec<(&str, SqlParam)>, id_col: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (col, v) in values {
        cols.push(quoted(col));
        placeholders.push(q.push_param(v));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}::bigint",
        qualified_table(&table.schema, &table.table),
        cols.join(", "),
        placeholders.join(", "),
        quoted(id_col)
    );
    q
}

/// UPDATE by key: SET only the given assignments. Caller ensures `sets` is non-empty.
pub fn update_by_id(table: &TableMap, sets: Vec<(&str, SqlParam)>, id_col: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let assignments: Vec<String> = sets
        .into_iter()
        .map(|(col, v)| format!("{} = {}", quoted(col), q.push_param(v)))
        .collect();
    let id_ph = q.push_param(SqlParam::Int(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        qualified_table(&table.schema, &table.table),
        assignments.join(", "),
        quoted(id_col),
        id_ph
    );
    q
}

/// DELETE by key.
pub fn delete_by_id(table: &TableMap, id_col: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlParam::Int(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(&table.schema, &table.table),
        quoted(id_col),
        ph
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::pick_columns;

    fn raw_table() -> TableMap {
        let existing: Vec<String> = ["MaterialID", "MaterialName", "Lowstock"].iter().map(|s| s.to_string()).collect();
        let columns = pick_columns(
            "RawMaterials",
            &existing,
            &[("id", &["MaterialID"]), ("name", &["MaterialName"]), ("low", &["Lowstock"])],
        )
        .unwrap();
        TableMap {
            schema: "public".into(),
            table: "RawMaterials".into(),
            columns,
        }
    }

    #[test]
    fn select_quotes_identifiers_and_aliases() {
        let t = raw_table();
        let q = select_rows(
            &t,
            &[Selected::new("MaterialID", "MaterialID"), Selected::cast("Lowstock", "Lowstock", "bigint")],
            &[],
            "MaterialID",
            Order::Desc,
        );
        assert_eq!(
            q.sql,
            r#"SELECT "MaterialID" AS "MaterialID", "Lowstock"::bigint AS "Lowstock" FROM "public"."RawMaterials" ORDER BY "MaterialID" DESC"#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn filters_number_placeholders_in_order() {
        let t = raw_table();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let q = select_rows(
            &t,
            &[Selected::new("MaterialID", "id")],
            &[
                Filter::eq("ItemType", SqlParam::text_for("RawMaterial", Some("\"public\".\"item_type\""))),
                Filter::date_from("TimeUpdate", day),
                Filter::eq("ChangedBy", 3i64),
            ],
            "MaterialID",
            Order::Asc,
        );
        assert!(q.sql.contains(r#"WHERE "ItemType" = $1::"public"."item_type" AND CAST("TimeUpdate" AS date) >= $2 AND "ChangedBy" = $3"#));
        assert_eq!(q.params.len(), 3);
    }

    #[test]
    fn insert_renders_null_inline() {
        let t = raw_table();
        let q = insert_returning(
            &t,
            vec![("MaterialName", SqlParam::from("Flour")), ("Lowstock", SqlParam::Null)],
            "MaterialID",
        );
        assert_eq!(
            q.sql,
            r#"INSERT INTO "public"."RawMaterials" ("MaterialName", "Lowstock") VALUES ($1, NULL) RETURNING "MaterialID"::bigint"#
        );
        assert_eq!(q.params, vec![SqlParam::Text("Flour".into())]);
    }

    #[test]
    fn update_binds_key_last() {
        let t = raw_table();
        let q = update_by_id(&t, vec![("MaterialName", "Sugar".into()), ("Lowstock", 5i64.into())], "MaterialID", 9);
        assert_eq!(
            q.sql,
            r#"UPDATE "public"."RawMaterials" SET "MaterialName" = $1, "Lowstock" = $2 WHERE "MaterialID" = $3"#
        );
        assert_eq!(q.params.last(), Some(&SqlParam::Int(9)));
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(quoted(r#"we"ird"#), r#""we""ird""#);
    }
}
