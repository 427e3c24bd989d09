//! Users over either the `users` or `user` table, with an optional role join.

use crate::auth::hash_password;
use crate::error::AppError;
use crate::schema::{SchemaCatalog, SchemaResolver, TableMap, ROLES, USERS};
use crate::service::exec::SqlExec;
use crate::service::validation;
use crate::sql::{delete_by_id, insert_returning, qualified_table, quoted, update_by_id, QueryBuf, SqlParam};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserItem {
    pub user_id: i64,
    pub table_used: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl UserBody {
    /// Trimmed copy that passed every field check.
    fn validated(&self) -> Result<UserBody, AppError> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();
        validation::username(&username)?;
        validation::email(&email)?;
        validation::min_chars("password", &self.password, 8)?;
        if let Some(phone) = &self.phone {
            validation::max_chars("phone", phone, 20)?;
        }
        Ok(UserBody {
            username,
            email,
            ..self.clone()
        })
    }
}

/// What login needs to check a password.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: Option<bool>,
}

/// Resolved user table plus the role table when both it and the user's role column exist.
pub struct UserTables {
    pub users: TableMap,
    pub roles: Option<TableMap>,
}

impl UserTables {
    pub async fn resolve<C: SchemaCatalog>(resolver: &SchemaResolver<C>) -> Result<Self, AppError> {
        let users = resolver.resolve_spec(&USERS).await?;
        let roles = if users.has("role_id") {
            resolver.find_spec(&ROLES).await?
        } else {
            None
        };
        Ok(UserTables { users, roles })
    }

    fn optional(&self, key: &str, cast: &str, alias: &str) -> String {
        match self.users.columns.get(key) {
            Some(col) => format!("u.{}::{} AS {}", quoted(col), cast, quoted(alias)),
            None => format!("NULL::{} AS {}", cast, quoted(alias)),
        }
    }

    /// `SELECT .. FROM users u [LEFT JOIN roles r]` with every output column always present.
    fn select_head(&self) -> Result<String, AppError> {
        let u = &self.users;
        let mut fields = vec![
            format!("u.{}::bigint AS \"user_id\"", quoted(u.col("id")?)),
            format!("u.{}::text AS \"username\"", quoted(u.col("username")?)),
            format!("u.{}::text AS \"email\"", quoted(u.col("email")?)),
            self.optional("phone", "text", "phone"),
            self.optional("birthdate", "date", "birthdate"),
            self.optional("role_id", "bigint", "role_id"),
            self.optional("is_active", "boolean", "is_active"),
        ];
        let mut join = String::new();
        match &self.roles {
            Some(r) => {
                fields.push(format!("r.{}::text AS \"role_name\"", quoted(r.col("name")?)));
                join = format!(
                    " LEFT JOIN {} r ON u.{} = r.{}",
                    qualified_table(&r.schema, &r.table),
                    quoted(u.col("role_id")?),
                    quoted(r.col("id")?)
                );
            }
            None => fields.push("NULL::text AS \"role_name\"".into()),
        }
        Ok(format!(
            "SELECT {} FROM {} u{}",
            fields.join(", "),
            qualified_table(&u.schema, &u.table),
            join
        ))
    }

    fn list_query(&self) -> Result<QueryBuf, AppError> {
        let mut q = QueryBuf::new();
        q.sql = format!("{} ORDER BY u.{} ASC", self.select_head()?, quoted(self.users.col("id")?));
        Ok(q)
    }

    fn read_query(&self, id: i64) -> Result<QueryBuf, AppError> {
        let mut q = QueryBuf::new();
        let ph = q.push_param(SqlParam::Int(id));
        q.sql = format!("{} WHERE u.{} = {}", self.select_head()?, quoted(self.users.col("id")?), ph);
        Ok(q)
    }

    fn duplicate_query(&self, username: &str, email: &str, exclude: Option<i64>) -> Result<QueryBuf, AppError> {
        let u = &self.users;
        let mut q = QueryBuf::new();
        let p_user = q.push_param(username.into());
        let p_email = q.push_param(email.into());
        let mut sql = format!(
            "SELECT 1 FROM {} WHERE ({} = {} OR {} = {})",
            qualified_table(&u.schema, &u.table),
            quoted(u.col("username")?),
            p_user,
            quoted(u.col("email")?),
            p_email
        );
        if let Some(id) = exclude {
            let p_id = q.push_param(SqlParam::Int(id));
            sql.push_str(&format!(" AND {} <> {}", quoted(u.col("id")?), p_id));
        }
        sql.push_str(" LIMIT 1");
        q.sql = sql;
        Ok(q)
    }

    fn credentials_query(&self, identifier: &str) -> Result<QueryBuf, AppError> {
        let u = &self.users;
        let mut q = QueryBuf::new();
        let p_user = q.push_param(identifier.into());
        let p_email = q.push_param(identifier.into());
        q.sql = format!(
            "SELECT u.{}::bigint AS \"user_id\", u.{}::text AS \"username\", u.{}::text AS \"password_hash\", {} FROM {} u WHERE u.{} = {} OR u.{} = {} LIMIT 1",
            quoted(u.col("id")?),
            quoted(u.col("username")?),
            quoted(u.col("password_hash")?),
            self.optional("is_active", "boolean", "is_active"),
            qualified_table(&u.schema, &u.table),
            quoted(u.col("username")?),
            p_user,
            quoted(u.col("email")?),
            p_email
        );
        Ok(q)
    }

    /// Values for every column this table variant has. Active defaults to true.
    fn write_values(&self, body: &UserBody) -> Result<Vec<(&str, SqlParam)>, AppError> {
        let u = &self.users;
        let mut values = vec![
            (u.col("username")?, SqlParam::from(body.username.as_str())),
            (u.col("email")?, SqlParam::from(body.email.as_str())),
            (u.col("password_hash")?, SqlParam::from(hash_password(&body.password))),
        ];
        if let Some(col) = u.columns.get("phone") {
            values.push((col, SqlParam::from(body.phone.clone())));
        }
        if let Some(col) = u.columns.get("birthdate") {
            values.push((col, SqlParam::from(body.birthdate)));
        }
        if let Some(col) = u.columns.get("role_id") {
            values.push((col, SqlParam::from(body.role_id)));
        }
        if let Some(col) = u.columns.get("is_active") {
            values.push((col, SqlParam::Bool(body.is_active.unwrap_or(true))));
        }
        Ok(values)
    }

    fn item_from_row(&self, row: &PgRow) -> Result<UserItem, AppError> {
        Ok(UserItem {
            user_id: row.try_get("user_id")?,
            table_used: self.users.table.clone(),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            birthdate: row.try_get("birthdate")?,
            role_id: row.try_get("role_id")?,
            role_name: row.try_get("role_name")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub struct UserService;

impl UserService {
    pub async fn list<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool) -> Result<Vec<UserItem>, AppError> {
        let t = UserTables::resolve(resolver).await?;
        let rows = SqlExec::fetch_rows(pool, &t.list_query()?).await?;
        rows.iter().map(|r| t.item_from_row(r)).collect()
    }

    pub async fn read<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, id: i64) -> Result<UserItem, AppError> {
        let t = UserTables::resolve(resolver).await?;
        Self::read_in(&t, pool, id).await?.ok_or_else(not_found)
    }

    async fn read_in(t: &UserTables, pool: &PgPool, id: i64) -> Result<Option<UserItem>, AppError> {
        let row = SqlExec::fetch_row(pool, &t.read_query(id)?).await?;
        row.map(|r| t.item_from_row(&r)).transpose()
    }

    async fn ensure_unique(t: &UserTables, pool: &PgPool, body: &UserBody, exclude: Option<i64>) -> Result<(), AppError> {
        let q = t.duplicate_query(&body.username, &body.email, exclude)?;
        if SqlExec::fetch_row(pool, &q).await?.is_some() {
            return Err(AppError::Conflict("Username or email already exists".into()));
        }
        Ok(())
    }

    pub async fn create<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, body: &UserBody) -> Result<UserItem, AppError> {
        let body = body.validated()?;
        let t = UserTables::resolve(resolver).await?;
        Self::ensure_unique(&t, pool, &body, None).await?;
        let q = insert_returning(&t.users, t.write_values(&body)?, t.users.col("id")?);
        let id = SqlExec::insert_id(pool, &q).await?;
        tracing::info!(user_id = id, table = %t.users.table, "user created");
        Self::read_in(&t, pool, id).await?.ok_or_else(not_found)
    }

    /// Full replace of every writable field.
    pub async fn update<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        id: i64,
        body: &UserBody,
    ) -> Result<UserItem, AppError> {
        let body = body.validated()?;
        let t = UserTables::resolve(resolver).await?;
        if Self::read_in(&t, pool, id).await?.is_none() {
            return Err(not_found());
        }
        Self::ensure_unique(&t, pool, &body, Some(id)).await?;
        let q = update_by_id(&t.users, t.write_values(&body)?, t.users.col("id")?, id);
        SqlExec::execute(pool, &q).await?;
        Self::read_in(&t, pool, id).await?.ok_or_else(not_found)
    }

    pub async fn delete<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, id: i64) -> Result<(), AppError> {
        let t = UserTables::resolve(resolver).await?;
        let q = delete_by_id(&t.users, t.users.col("id")?, id);
        if SqlExec::execute(pool, &q).await? == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    /// Look a user up by username or email.
    pub async fn find_credentials<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Credentials>, AppError> {
        let t = UserTables::resolve(resolver).await?;
        let row = SqlExec::fetch_row(pool, &t.credentials_query(identifier.trim())?).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Credentials {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::StaticCatalog;

    async fn tables(catalog: StaticCatalog) -> UserTables {
        UserTables::resolve(&SchemaResolver::new(catalog)).await.unwrap()
    }

    fn body() -> UserBody {
        UserBody {
            username: " chef_01 ".into(),
            email: "chef@foodco.vn".into(),
            password: "correct horse".into(),
            phone: None,
            birthdate: None,
            role_id: Some(2),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn users_variant_joins_roles() {
        let t = tables(
            StaticCatalog::default()
                .with_table("users", &["UserID", "UserName", "Email", "PasswordHash", "PhoneNumber", "RoleID", "IsActive"])
                .with_table("roles", &["RoleID", "RoleName"]),
        )
        .await;
        let sql = t.list_query().unwrap().sql;
        assert!(sql.contains(r#"u."PhoneNumber"::text AS "phone""#));
        assert!(sql.contains(r#"NULL::date AS "birthdate""#));
        assert!(sql.contains(r#"r."RoleName"::text AS "role_name""#));
        assert!(sql.contains(r#"LEFT JOIN "public"."roles" r ON u."RoleID" = r."RoleID""#));
        assert!(sql.ends_with(r#"ORDER BY u."UserID" ASC"#));
    }

    #[tokio::test]
    async fn user_variant_without_roles_table_has_null_role_name() {
        let t = tables(
            StaticCatalog::default().with_table("user", &["UserID", "Username", "Email", "PasswordHash", "Phonenumber", "RoleID"]),
        )
        .await;
        assert!(t.roles.is_none());
        let q = t.read_query(4).unwrap();
        assert!(q.sql.contains(r#"NULL::text AS "role_name""#));
        assert!(q.sql.contains(r#"FROM "public"."user" u WHERE u."UserID" = $1"#));
        assert_eq!(q.params, vec![SqlParam::Int(4)]);
    }

    #[tokio::test]
    async fn write_values_follow_present_columns() {
        let t = tables(StaticCatalog::default().with_table("users", &["UserID", "UserName", "Email", "PasswordHash", "IsActive"])).await;
        let b = body().validated().unwrap();
        let values = t.write_values(&b).unwrap();
        let cols: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
        assert_eq!(cols, vec!["UserName", "Email", "PasswordHash", "IsActive"]);
        assert_eq!(values[0].1, SqlParam::Text("chef_01".into()));
        assert_eq!(values[2].1, SqlParam::Text(hash_password("correct horse")));
        assert_eq!(values[3].1, SqlParam::Bool(true));
    }

    #[tokio::test]
    async fn duplicate_check_excludes_self_on_update() {
        let t = tables(StaticCatalog::default().with_table("users", &["UserID", "UserName", "Email", "PasswordHash"])).await;
        let q = t.duplicate_query("chef_01", "chef@foodco.vn", Some(3)).unwrap();
        assert_eq!(
            q.sql,
            r#"SELECT 1 FROM "public"."users" WHERE ("UserName" = $1 OR "Email" = $2) AND "UserID" <> $3 LIMIT 1"#
        );
    }

    #[test]
    fn body_validation() {
        assert!(body().validated().is_ok());
        let mut b = body();
        b.username = "no spaces allowed".into();
        assert!(b.validated().is_err());
        let mut b = body();
        b.email = "chef@".into();
        assert!(b.validated().is_err());
        let mut b = body();
        b.password = "short".into();
        assert!(b.validated().is_err());
        let mut b = body();
        b.phone = Some("0".repeat(21));
        assert!(b.validated().is_err());
    }
}
