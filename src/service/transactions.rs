//! Inventory transactions. Item type and transaction type are written as whatever literal
//! the deployed column declares.

use crate::error::AppError;
use crate::schema::{coerce_category, CategoryGroup, SchemaCatalog, SchemaResolver, TableMap, TRANSACTIONS};
use crate::service::exec::SqlExec;
use crate::service::validation;
use crate::sql::{delete_by_id, insert_returning, select_by_id, select_rows, update_by_id, Filter, Order, Selected, SqlParam};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

const TX_TYPES: &[&str] = &["Import", "Export"];

const OUT: &[(&str, &str, Option<&str>)] = &[
    ("id", "TransactionID", Some("bigint")),
    ("txType", "TransactionType", Some("text")),
    ("itemType", "ItemType", Some("text")),
    ("materialsId", "MaterialsId", Some("bigint")),
    ("productId", "ProductId", Some("bigint")),
    ("qty", "Qty", Some("float8")),
    ("beforeQty", "BeforeQty", Some("float8")),
    ("afterQty", "AfterQty", Some("float8")),
    ("note", "Note", Some("text")),
    ("changedBy", "ChangedBy", Some("bigint")),
    ("time", "TimeUpdate", None),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxCreate {
    pub transaction_type: String,
    pub item_type: String,
    pub materials_id: Option<i64>,
    pub product_id: Option<i64>,
    pub qty: f64,
    pub note: Option<String>,
    pub changed_by: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxUpdate {
    pub transaction_type: Option<String>,
    pub item_type: Option<String>,
    pub materials_id: Option<i64>,
    pub product_id: Option<i64>,
    pub qty: Option<f64>,
    pub note: Option<String>,
    pub changed_by: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TxListQuery {
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub item_type: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub changed_by: Option<i64>,
}

fn item_group(requested: &str) -> Result<CategoryGroup, AppError> {
    CategoryGroup::from_synonym(requested).ok_or_else(|| {
        AppError::Validation(format!(
            "ItemType must be one of Raw, RawMaterial, RawMaterials, Finished, FinishedProduct, FinishedGoods; got '{}'",
            requested
        ))
    })
}

fn check_tx_type(v: &str) -> Result<(), AppError> {
    validation::one_of("TransactionType", v, TX_TYPES)
}

/// Raw items carry a material id and no product id; finished items the reverse.
fn check_create(p: &TxCreate) -> Result<CategoryGroup, AppError> {
    check_tx_type(&p.transaction_type)?;
    let group = item_group(&p.item_type)?;
    validation::positive("Qty", p.qty)?;
    if let Some(note) = &p.note {
        validation::max_chars("Note", note, 255)?;
    }
    match group {
        CategoryGroup::Raw if p.materials_id.is_none() || p.product_id.is_some() => Err(AppError::Validation(
            "For ItemType=RawMaterials, provide MaterialsId and leave ProductId NULL".into(),
        )),
        CategoryGroup::Finished if p.product_id.is_none() || p.materials_id.is_some() => Err(AppError::Validation(
            "For ItemType=FinishedGoods, provide ProductId and leave MaterialsId NULL".into(),
        )),
        _ => Ok(group),
    }
}

/// Zero is accepted as "no id" for the side being cleared.
fn check_update(p: &TxUpdate) -> Result<Option<CategoryGroup>, AppError> {
    if let Some(t) = &p.transaction_type {
        check_tx_type(t)?;
    }
    if let Some(q) = p.qty {
        validation::positive("Qty", q)?;
    }
    if let Some(note) = &p.note {
        validation::max_chars("Note", note, 255)?;
    }
    let group = p.item_type.as_deref().map(item_group).transpose()?;
    match group {
        Some(CategoryGroup::Raw) => {
            if p.product_id.is_some_and(|id| id != 0) {
                return Err(AppError::Validation("For ItemType=RawMaterials, ProductId must be NULL".into()));
            }
            if p.materials_id.is_none() {
                return Err(AppError::Validation("For ItemType=RawMaterials, MaterialsId is required".into()));
            }
        }
        Some(CategoryGroup::Finished) => {
            if p.materials_id.is_some_and(|id| id != 0) {
                return Err(AppError::Validation("For ItemType=FinishedGoods, MaterialsId must be NULL".into()));
            }
            if p.product_id.is_none() {
                return Err(AppError::Validation("For ItemType=FinishedGoods, ProductId is required".into()));
            }
        }
        None => {}
    }
    Ok(group)
}

fn projection(map: &TableMap) -> Result<Vec<Selected<'_>>, AppError> {
    let mut cols = Vec::new();
    for (key, alias, cast) in OUT {
        let col = map.col(key)?;
        cols.push(match cast {
            Some(c) => Selected::cast(col, alias, c),
            None => Selected::new(col, alias),
        });
    }
    Ok(cols)
}

fn create_values<'m>(map: &'m TableMap, p: &TxCreate, group: CategoryGroup, tx_type: SqlParam, item_type: SqlParam) -> Result<Vec<(&'m str, SqlParam)>, AppError> {
    let mut values = vec![
        (map.col("txType")?, tx_type),
        (map.col("itemType")?, item_type),
        (map.col("qty")?, SqlParam::Float(p.qty)),
        (map.col("changedBy")?, SqlParam::Int(p.changed_by)),
    ];
    match group {
        CategoryGroup::Raw => values.push((map.col("materialsId")?, SqlParam::from(p.materials_id))),
        CategoryGroup::Finished => values.push((map.col("productId")?, SqlParam::from(p.product_id))),
    }
    if let Some(note) = &p.note {
        values.push((map.col("note")?, SqlParam::from(note.as_str())));
    }
    Ok(values)
}

/// Assignments for a partial update. A new item type clears the opposite foreign key.
fn update_values<'m>(
    map: &'m TableMap,
    p: &TxUpdate,
    tx_type: Option<SqlParam>,
    item: Option<(CategoryGroup, SqlParam)>,
) -> Result<Vec<(&'m str, SqlParam)>, AppError> {
    let mut sets = Vec::new();
    if let Some(t) = tx_type {
        sets.push((map.col("txType")?, t));
    }
    let mut cleared = None;
    if let Some((group, literal)) = item {
        sets.push((map.col("itemType")?, literal));
        let opposite = match group {
            CategoryGroup::Raw => map.col("productId")?,
            CategoryGroup::Finished => map.col("materialsId")?,
        };
        sets.push((opposite, SqlParam::Null));
        cleared = Some(opposite);
    }
    if let Some(id) = p.materials_id {
        let col = map.col("materialsId")?;
        if cleared != Some(col) {
            sets.push((col, SqlParam::Int(id)));
        }
    }
    if let Some(id) = p.product_id {
        let col = map.col("productId")?;
        if cleared != Some(col) {
            sets.push((col, SqlParam::Int(id)));
        }
    }
    if let Some(q) = p.qty {
        sets.push((map.col("qty")?, SqlParam::Float(q)));
    }
    if let Some(note) = &p.note {
        sets.push((map.col("note")?, SqlParam::from(note.as_str())));
    }
    if let Some(by) = p.changed_by {
        sets.push((map.col("changedBy")?, SqlParam::Int(by)));
    }
    if sets.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    Ok(sets)
}

pub struct TransactionService;

impl TransactionService {
    /// Stored literal for an item-type group: coerced against the enum when the column is one,
    /// otherwise the group's canonical name.
    async fn item_literal<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        map: &TableMap,
        group: CategoryGroup,
    ) -> Result<SqlParam, AppError> {
        let column = resolver.enum_column(&map.table, map.col("itemType")?).await?;
        if !column.is_enum() {
            return Ok(SqlParam::from(group.canonical()));
        }
        let literal = coerce_category(group.canonical(), &column.literals)?;
        Ok(SqlParam::text_for(literal, column.cast.as_deref()))
    }

    async fn tx_type_literal<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        map: &TableMap,
        requested: &str,
    ) -> Result<SqlParam, AppError> {
        let column = resolver.enum_column(&map.table, map.col("txType")?).await?;
        if !column.is_enum() {
            return Ok(SqlParam::from(requested));
        }
        let literal = coerce_category(requested, &column.literals)?;
        Ok(SqlParam::text_for(literal, column.cast.as_deref()))
    }

    pub async fn list<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        query: &TxListQuery,
    ) -> Result<Vec<Value>, AppError> {
        let map = resolver.resolve_spec(&TRANSACTIONS).await?;
        let mut filters = Vec::new();
        if let Some(t) = &query.tx_type {
            check_tx_type(t)?;
            let literal = Self::tx_type_literal(resolver, &map, t).await?;
            filters.push(Filter::eq(map.col("txType")?, literal));
        }
        if let Some(item) = &query.item_type {
            let literal = Self::item_literal(resolver, &map, item_group(item)?).await?;
            filters.push(Filter::eq(map.col("itemType")?, literal));
        }
        if let Some(by) = query.changed_by {
            filters.push(Filter::eq(map.col("changedBy")?, by));
        }
        if let Some(d) = query.from_date {
            filters.push(Filter::date_from(map.col("time")?, d));
        }
        if let Some(d) = query.to_date {
            filters.push(Filter::date_to(map.col("time")?, d));
        }
        let cols = projection(&map)?;
        let q = select_rows(&map, &cols, &filters, map.col("id")?, Order::Desc);
        SqlExec::fetch_all(pool, &q).await
    }

    pub async fn read<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, id: i64) -> Result<Value, AppError> {
        let map = resolver.resolve_spec(&TRANSACTIONS).await?;
        let cols = projection(&map)?;
        let q = select_by_id(&map, &cols, map.col("id")?, id);
        SqlExec::fetch_optional(pool, &q)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".into()))
    }

    pub async fn create<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, p: &TxCreate) -> Result<i64, AppError> {
        let group = check_create(p)?;
        let map = resolver.resolve_spec(&TRANSACTIONS).await?;
        let tx_type = Self::tx_type_literal(resolver, &map, &p.transaction_type).await?;
        let item_type = Self::item_literal(resolver, &map, group).await?;
        let values = create_values(&map, p, group, tx_type, item_type)?;
        let q = insert_returning(&map, values, map.col("id")?);
        let id = SqlExec::insert_id(pool, &q).await?;
        tracing::info!(transaction_id = id, item_type = ?group, "transaction recorded");
        Ok(id)
    }

    pub async fn update<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        id: i64,
        p: &TxUpdate,
    ) -> Result<(), AppError> {
        let group = check_update(p)?;
        let map = resolver.resolve_spec(&TRANSACTIONS).await?;
        let tx_type = match &p.transaction_type {
            Some(t) => Some(Self::tx_type_literal(resolver, &map, t).await?),
            None => None,
        };
        let item = match group {
            Some(g) => Some((g, Self::item_literal(resolver, &map, g).await?)),
            None => None,
        };
        let sets = update_values(&map, p, tx_type, item)?;
        let q = update_by_id(&map, sets, map.col("id")?, id);
        if SqlExec::execute(pool, &q).await? == 0 {
            return Err(AppError::NotFound("Transaction not found".into()));
        }
        Ok(())
    }

    pub async fn delete<C: SchemaCatalog>(resolver: &SchemaResolver<C>, pool: &PgPool, id: i64) -> Result<(), AppError> {
        let map = resolver.resolve_spec(&TRANSACTIONS).await?;
        let q = delete_by_id(&map, map.col("id")?, id);
        if SqlExec::execute(pool, &q).await? == 0 {
            return Err(AppError::NotFound("Transaction not found".into()));
        }
        Ok(())
    }
}
