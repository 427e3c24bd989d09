//! Metadata catalog access: which tables and columns exist, and what a column's type is.

use crate::error::AppError;
use crate::sql::quoted;
use async_trait::async_trait;
use sqlx::PgPool;

/// Declared type of one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnType {
    /// `enum('a','b',...)` for enumerated columns, otherwise the SQL data type name.
    pub descriptor: String,
    /// Qualified type name usable in a `$n::<cast>` placeholder.
    pub cast: String,
}

#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Namespace the tables live in, used to qualify statements.
    fn schema_name(&self) -> &str;

    async fn table_names(&self) -> Result<Vec<String>, AppError>;

    async fn column_names(&self, table: &str) -> Result<Vec<String>, AppError>;

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<ColumnType>, AppError>;
}

/// Catalog of one PostgreSQL schema, read from `information_schema` and `pg_enum`.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    schema: String,
}

impl PgCatalog {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgCatalog {
            pool,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl SchemaCatalog for PgCatalog {
    fn schema_name(&self) -> &str {
        &self.schema
    }

    async fn table_names(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            select table_name::text
            from information_schema.tables
            where table_schema = $1
            "#,
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    async fn column_names(&self, table: &str) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            select column_name::text
            from information_schema.columns
            where table_schema = $1 and table_name = $2
            order by ordinal_position
            "#,
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<ColumnType>, AppError> {
        let row: Option<(String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            select c.data_type::text,
                   c.udt_schema::text,
                   c.udt_name::text,
                   (select 'enum(' || string_agg(quote_literal(e.enumlabel::text), ',' order by e.enumsortorder) || ')'
                      from pg_catalog.pg_type t
                      join pg_catalog.pg_namespace n on n.oid = t.typnamespace
                      join pg_catalog.pg_enum e on e.enumtypid = t.oid
                     where n.nspname = c.udt_schema and t.typname = c.udt_name)
            from information_schema.columns c
            where c.table_schema = $1 and c.table_name = $2 and c.column_name = $3
            "#,
        )
        .bind(&self.schema)
        .bind(table)
        .bind(column)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(data_type, udt_schema, udt_name, enum_descriptor)| ColumnType {
            descriptor: enum_descriptor.unwrap_or(data_type),
            cast: format!("{}.{}", quoted(&udt_schema), quoted(&udt_name)),
        }))
    }
}

/// Fixed in-memory catalog for resolver tests.
#[cfg(test)]
#[derive(Default)]
pub struct StaticCatalog {
    pub tables: Vec<(String, Vec<(String, Option<String>)>)>,
}

#[cfg(test)]
impl StaticCatalog {
    pub fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.tables.push((
            name.to_string(),
            columns.iter().map(|c| (c.to_string(), None)).collect(),
        ));
        self
    }

    pub fn with_typed_column(mut self, table: &str, column: &str, descriptor: &str) -> Self {
        if let Some((_, cols)) = self.tables.iter_mut().find(|(t, _)| t == table) {
            cols.push((column.to_string(), Some(descriptor.to_string())));
        }
        self
    }
}

#[cfg(test)]
#[async_trait]
impl SchemaCatalog for StaticCatalog {
    fn schema_name(&self) -> &str {
        "public"
    }

    async fn table_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.tables.iter().map(|(t, _)| t.clone()).collect())
    }

    async fn column_names(&self, table: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .tables
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, cols)| cols.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default())
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<ColumnType>, AppError> {
        Ok(self
            .tables
            .iter()
            .find(|(t, _)| t == table)
            .and_then(|(_, cols)| cols.iter().find(|(c, _)| c == column))
            .map(|(c, d)| ColumnType {
                descriptor: d.clone().unwrap_or_else(|| "text".into()),
                cast: format!("\"public\".\"{}_type\"", c.to_lowercase()),
            }))
    }
}
