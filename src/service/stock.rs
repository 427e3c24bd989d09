//! Raw materials and finished goods: CRUD over whichever stock table variant is deployed.

use crate::error::AppError;
use crate::schema::{SchemaCatalog, SchemaResolver, TableMap, TableSpec, FINISHED_GOODS, RAW_MATERIALS};
use crate::service::exec::SqlExec;
use crate::service::validation;
use crate::sql::{delete_by_id, insert_returning, select_by_id, select_rows, update_by_id, Order, Selected, SqlParam};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockKind {
    Raw,
    Finished,
}

/// Logical key, response field name, projection cast.
type OutField = (&'static str, &'static str, Option<&'static str>);

const RAW_OUT: &[OutField] = &[
    ("id", "MaterialID", Some("bigint")),
    ("name", "MaterialName", Some("text")),
    ("quantity", "MaterialQuantity", Some("bigint")),
    ("low", "Lowstock", Some("bigint")),
    ("unit", "Unit", Some("text")),
    ("time", "TimeUpdate", None),
];

const FINISHED_OUT: &[OutField] = &[
    ("id", "GoodsID", Some("bigint")),
    ("name", "FinishedGoodsName", Some("text")),
    ("quantity", "FinishedGoodsQuantity", Some("bigint")),
    ("low", "Lowstock", Some("bigint")),
    ("time", "TimeUpdate", None),
];

impl StockKind {
    pub fn spec(self) -> &'static TableSpec {
        match self {
            StockKind::Raw => &RAW_MATERIALS,
            StockKind::Finished => &FINISHED_GOODS,
        }
    }

    fn out_fields(self) -> &'static [OutField] {
        match self {
            StockKind::Raw => RAW_OUT,
            StockKind::Finished => FINISHED_OUT,
        }
    }

    fn not_found(self) -> AppError {
        AppError::NotFound(match self {
            StockKind::Raw => "Raw material not found".into(),
            StockKind::Finished => "Finished goods not found".into(),
        })
    }

    /// Body field names as the API exposes them.
    fn name_field(self) -> &'static str {
        match self {
            StockKind::Raw => "MaterialName",
            StockKind::Finished => "FinishedGoodsName",
        }
    }

    fn quantity_field(self) -> &'static str {
        match self {
            StockKind::Raw => "MaterialQuantity",
            StockKind::Finished => "FinishedGoodsQuantity",
        }
    }
}

/// Kind-neutral stock body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockInput {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub low: Option<i64>,
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMaterialBody {
    #[serde(rename = "MaterialName")]
    pub name: Option<String>,
    #[serde(rename = "MaterialQuantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "Lowstock")]
    pub low: Option<i64>,
    #[serde(rename = "Unit")]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinishedGoodsBody {
    #[serde(rename = "FinishedGoodsName")]
    pub name: Option<String>,
    #[serde(rename = "FinishedGoodsQuantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "Lowstock")]
    pub low: Option<i64>,
}

impl From<RawMaterialBody> for StockInput {
    fn from(b: RawMaterialBody) -> Self {
        StockInput {
            name: b.name,
            quantity: b.quantity,
            low: b.low,
            unit: b.unit,
        }
    }
}

impl From<FinishedGoodsBody> for StockInput {
    fn from(b: FinishedGoodsBody) -> Self {
        StockInput {
            name: b.name,
            quantity: b.quantity,
            low: b.low,
            unit: None,
        }
    }
}

fn projection(map: &TableMap, kind: StockKind) -> Result<Vec<Selected<'_>>, AppError> {
    let mut cols = Vec::new();
    for (key, alias, cast) in kind.out_fields() {
        let col = map.col(key)?;
        cols.push(match cast {
            Some(c) => Selected::cast(col, alias, c),
            None => Selected::new(col, alias),
        });
    }
    Ok(cols)
}

fn check_present(kind: StockKind, input: &StockInput) -> Result<(), AppError> {
    if let Some(name) = &input.name {
        validation::max_chars(kind.name_field(), name, 100)?;
    }
    if let Some(q) = input.quantity {
        validation::non_negative(kind.quantity_field(), q)?;
    }
    if let Some(low) = input.low {
        validation::non_negative("Lowstock", low)?;
    }
    if let (StockKind::Raw, Some(unit)) = (kind, &input.unit) {
        validation::max_chars("Unit", unit, 10)?;
    }
    Ok(())
}

/// Columns and values for a new row. Quantity defaults to 0; low stock is written even when absent.
fn insert_values<'m>(map: &'m TableMap, kind: StockKind, input: &StockInput) -> Result<Vec<(&'m str, SqlParam)>, AppError> {
    check_present(kind, input)?;
    let name = validation::required(kind.name_field(), input.name.as_ref())?;
    let mut values = vec![
        (map.col("name")?, SqlParam::from(name.as_str())),
        (map.col("quantity")?, SqlParam::Int(input.quantity.unwrap_or(0))),
        (map.col("low")?, SqlParam::from(input.low)),
    ];
    if kind == StockKind::Raw {
        let unit = validation::required("Unit", input.unit.as_ref())?;
        values.push((map.col("unit")?, SqlParam::from(unit.as_str())));
    }
    Ok(values)
}

/// Assignments for the provided fields only.
fn update_values<'m>(map: &'m TableMap, kind: StockKind, input: &StockInput) -> Result<Vec<(&'m str, SqlParam)>, AppError> {
    check_present(kind, input)?;
    let mut sets = Vec::new();
    if let Some(name) = &input.name {
        sets.push((map.col("name")?, SqlParam::from(name.as_str())));
    }
    if let Some(q) = input.quantity {
        sets.push((map.col("quantity")?, SqlParam::Int(q)));
    }
    if let Some(low) = input.low {
        sets.push((map.col("low")?, SqlParam::Int(low)));
    }
    if let (StockKind::Raw, Some(unit)) = (kind, &input.unit) {
        sets.push((map.col("unit")?, SqlParam::from(unit.as_str())));
    }
    if sets.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    Ok(sets)
}

pub struct StockService;

impl StockService {
    /// All rows, newest id first.
    pub async fn list<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        kind: StockKind,
    ) -> Result<Vec<Value>, AppError> {
        let map = resolver.resolve_spec(kind.spec()).await?;
        let cols = projection(&map, kind)?;
        let q = select_rows(&map, &cols, &[], map.col("id")?, Order::Desc);
        SqlExec::fetch_all(pool, &q).await
    }

    pub async fn read<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        kind: StockKind,
        id: i64,
    ) -> Result<Value, AppError> {
        let map = resolver.resolve_spec(kind.spec()).await?;
        let cols = projection(&map, kind)?;
        let q = select_by_id(&map, &cols, map.col("id")?, id);
        SqlExec::fetch_optional(pool, &q).await?.ok_or_else(|| kind.not_found())
    }

    /// Insert and return the new id.
    pub async fn create<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        kind: StockKind,
        input: &StockInput,
    ) -> Result<i64, AppError> {
        let map = resolver.resolve_spec(kind.spec()).await?;
        let values = insert_values(&map, kind, input)?;
        let q = insert_returning(&map, values, map.col("id")?);
        SqlExec::insert_id(pool, &q).await
    }

    pub async fn update<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        kind: StockKind,
        id: i64,
        input: &StockInput,
    ) -> Result<(), AppError> {
        let map = resolver.resolve_spec(kind.spec()).await?;
        let sets = update_values(&map, kind, input)?;
        let q = update_by_id(&map, sets, map.col("id")?, id);
        if SqlExec::execute(pool, &q).await? == 0 {
            return Err(kind.not_found());
        }
        Ok(())
    }

    pub async fn delete<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        kind: StockKind,
        id: i64,
    ) -> Result<(), AppError> {
        let map = resolver.resolve_spec(kind.spec()).await?;
        let q = delete_by_id(&map, map.col("id")?, id);
        if SqlExec::execute(pool, &q).await? == 0 {
            return Err(kind.not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::StaticCatalog;

    async fn raw_map() -> TableMap {
        let catalog = StaticCatalog::default().with_table(
            "raw_materials",
            &["MaterialsId", "MaterialsName", "Quantity", "LowStock", "Unit", "updated_at"],
        );
        SchemaResolver::new(catalog).resolve_spec(&RAW_MATERIALS).await.unwrap()
    }

    async fn finished_map() -> TableMap {
        let catalog = StaticCatalog::default().with_table(
            "FinishedGoods",
            &["GoodsID", "FinishedGoodsName", "FinishedGoodsQuantity", "Lowstock", "TimeUpdate"],
        );
        SchemaResolver::new(catalog).resolve_spec(&FINISHED_GOODS).await.unwrap()
    }

    #[tokio::test]
    async fn projection_aliases_physical_columns_to_api_names() {
        let map = raw_map().await;
        let cols = projection(&map, StockKind::Raw).unwrap();
        let pairs: Vec<(&str, &str)> = cols.iter().map(|s| (s.column, s.alias)).collect();
        assert_eq!(
            pairs,
            vec![
                ("MaterialsId", "MaterialID"),
                ("MaterialsName", "MaterialName"),
                ("Quantity", "MaterialQuantity"),
                ("LowStock", "Lowstock"),
                ("Unit", "Unit"),
                ("updated_at", "TimeUpdate"),
            ]
        );
    }

    #[tokio::test]
    async fn raw_create_requires_unit_and_defaults_quantity() {
        let map = raw_map().await;
        let input = StockInput {
            name: Some("Flour".into()),
            unit: Some("kg".into()),
            ..Default::default()
        };
        let values = insert_values(&map, StockKind::Raw, &input).unwrap();
        assert_eq!(
            values,
            vec![
                ("MaterialsName", SqlParam::Text("Flour".into())),
                ("Quantity", SqlParam::Int(0)),
                ("LowStock", SqlParam::Null),
                ("Unit", SqlParam::Text("kg".into())),
            ]
        );

        let no_unit = StockInput {
            name: Some("Flour".into()),
            ..Default::default()
        };
        assert!(matches!(insert_values(&map, StockKind::Raw, &no_unit), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn finished_goods_never_write_a_unit() {
        let map = finished_map().await;
        let input = StockInput::from(FinishedGoodsBody {
            name: Some("Bread".into()),
            quantity: Some(12),
            low: Some(3),
        });
        let values = insert_values(&map, StockKind::Finished, &input).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|(c, _)| *c != "Unit"));
    }

    #[tokio::test]
    async fn bounds_are_enforced() {
        let map = raw_map().await;
        let negative = StockInput {
            name: Some("Salt".into()),
            quantity: Some(-1),
            unit: Some("kg".into()),
            ..Default::default()
        };
        assert!(insert_values(&map, StockKind::Raw, &negative).is_err());

        let long_unit = StockInput {
            unit: Some("kilograms!!".into()),
            ..Default::default()
        };
        assert!(update_values(&map, StockKind::Raw, &long_unit).is_err());
    }

    #[tokio::test]
    async fn empty_update_is_a_bad_request() {
        let map = finished_map().await;
        let err = update_values(&map, StockKind::Finished, &StockInput::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let sets = update_values(
            &map,
            StockKind::Finished,
            &StockInput {
                low: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(sets, vec![("Lowstock", SqlParam::Int(4))]);
    }

    #[test]
    fn raw_body_uses_api_field_names() {
        let body: RawMaterialBody =
            serde_json::from_str(r#"{"MaterialName":"Sugar","MaterialQuantity":5,"Unit":"kg"}"#).unwrap();
        let input = StockInput::from(body);
        assert_eq!(input.name.as_deref(), Some("Sugar"));
        assert_eq!(input.quantity, Some(5));
        assert_eq!(input.low, None);
    }
}
