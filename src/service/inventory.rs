//! Unified inventory view over both stock tables.

use crate::error::AppError;
use crate::schema::{SchemaCatalog, SchemaResolver, FINISHED_GOODS, RAW_MATERIALS};
use crate::service::exec::SqlExec;
use crate::sql::{select_rows, Order, Selected};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    // declaration order is the sort order
    Finished,
    Raw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "OK")]
    Ok,
    Low,
    Out,
}

impl StockStatus {
    pub fn of(quantity: i64, low: Option<i64>) -> Self {
        if quantity <= 0 {
            return StockStatus::Out;
        }
        match low {
            Some(low) if quantity <= low => StockStatus::Low,
            _ => StockStatus::Ok,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub low_stock: i64,
    pub updated_at: Option<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub status: StockStatus,
}

impl InventoryItem {
    /// Normalize one aliased row (`id, name, quantity, unit, lowStock, updatedAt`).
    fn from_row(row: &Value, kind: ItemKind) -> Self {
        let id = row.get("id").and_then(Value::as_i64).unwrap_or(0);
        let quantity = row.get("quantity").and_then(Value::as_i64).unwrap_or(0);
        let low = row.get("lowStock").and_then(Value::as_i64);
        let unit = match kind {
            ItemKind::Raw => row
                .get("unit")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
                .unwrap_or("-")
                .to_string(),
            ItemKind::Finished => "-".to_string(),
        };
        let prefix = match kind {
            ItemKind::Raw => "RM",
            ItemKind::Finished => "FG",
        };
        InventoryItem {
            id,
            code: format!("{}-{:04}", prefix, id),
            name: row.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            quantity,
            unit,
            low_stock: low.unwrap_or(0),
            updated_at: row.get("updatedAt").and_then(Value::as_str).map(str::to_string),
            kind,
            status: StockStatus::of(quantity, low),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilter {
    #[serde(rename = "type")]
    pub kind: Option<ItemKind>,
    pub status: Option<StockStatus>,
    #[serde(rename = "inStockOnly", default)]
    pub in_stock_only: bool,
    pub search: Option<String>,
}

impl InventoryFilter {
    fn matches(&self, item: &InventoryItem, needle: &str) -> bool {
        if self.kind.is_some_and(|k| k != item.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.in_stock_only && item.quantity <= 0 {
            return false;
        }
        needle.is_empty()
            || item.name.to_lowercase().contains(needle)
            || item.code.to_lowercase().contains(needle)
    }

    /// Filter, then order by (type, id) descending.
    pub fn apply(&self, items: Vec<InventoryItem>) -> Vec<InventoryItem> {
        let needle = self.search.as_deref().map(str::trim).unwrap_or("").to_lowercase();
        let mut out: Vec<InventoryItem> = items.into_iter().filter(|it| self.matches(it, &needle)).collect();
        out.sort_by(|a, b| (b.kind, b.id).cmp(&(a.kind, a.id)));
        out
    }
}

pub struct InventoryService;

impl InventoryService {
    pub async fn list<C: SchemaCatalog>(
        resolver: &SchemaResolver<C>,
        pool: &PgPool,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let raw = resolver.resolve_spec(&RAW_MATERIALS).await?;
        let raw_cols = [
            Selected::cast(raw.col("id")?, "id", "bigint"),
            Selected::cast(raw.col("name")?, "name", "text"),
            Selected::cast(raw.col("quantity")?, "quantity", "bigint"),
            Selected::cast(raw.col("unit")?, "unit", "text"),
            Selected::cast(raw.col("low")?, "lowStock", "bigint"),
            Selected::new(raw.col("time")?, "updatedAt"),
        ];
        let q = select_rows(&raw, &raw_cols, &[], raw.col("id")?, Order::Desc);
        let raw_rows = SqlExec::fetch_all(pool, &q).await?;

        let fin = resolver.resolve_spec(&FINISHED_GOODS).await?;
        let fin_cols = [
            Selected::cast(fin.col("id")?, "id", "bigint"),
            Selected::cast(fin.col("name")?, "name", "text"),
            Selected::cast(fin.col("quantity")?, "quantity", "bigint"),
            Selected::cast(fin.col("low")?, "lowStock", "bigint"),
            Selected::new(fin.col("time")?, "updatedAt"),
        ];
        let q = select_rows(&fin, &fin_cols, &[], fin.col("id")?, Order::Desc);
        let fin_rows = SqlExec::fetch_all(pool, &q).await?;

        let items = raw_rows
            .iter()
            .map(|r| InventoryItem::from_row(r, ItemKind::Raw))
            .chain(fin_rows.iter().map(|r| InventoryItem::from_row(r, ItemKind::Finished)))
            .collect();
        Ok(filter.apply(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(kind: ItemKind, id: i64, name: &str, qty: i64, low: Option<i64>) -> InventoryItem {
        InventoryItem::from_row(
            &json!({ "id": id, "name": name, "quantity": qty, "unit": "kg", "lowStock": low, "updatedAt": null }),
            kind,
        )
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(StockStatus::of(0, Some(5)), StockStatus::Out);
        assert_eq!(StockStatus::of(-2, None), StockStatus::Out);
        assert_eq!(StockStatus::of(5, Some(5)), StockStatus::Low);
        assert_eq!(StockStatus::of(6, Some(5)), StockStatus::Ok);
        assert_eq!(StockStatus::of(1, None), StockStatus::Ok);
    }

    #[test]
    fn rows_normalize_with_codes_and_units() {
        let raw = item(ItemKind::Raw, 7, "Flour", 3, None);
        assert_eq!(raw.code, "RM-0007");
        assert_eq!(raw.unit, "kg");
        assert_eq!(raw.low_stock, 0);

        let fin = item(ItemKind::Finished, 12345, "Bread", 0, Some(2));
        assert_eq!(fin.code, "FG-12345");
        assert_eq!(fin.unit, "-");
        assert_eq!(fin.status, StockStatus::Out);

        let no_unit = InventoryItem::from_row(&json!({ "id": 1, "name": "Salt", "quantity": 1, "unit": null }), ItemKind::Raw);
        assert_eq!(no_unit.unit, "-");
    }

    #[test]
    fn serializes_with_api_field_names() {
        let v = serde_json::to_value(item(ItemKind::Raw, 1, "Flour", 9, Some(2))).unwrap();
        assert_eq!(v["type"], "Raw");
        assert_eq!(v["status"], "OK");
        assert_eq!(v["lowStock"], 2);
        assert!(v.get("updatedAt").is_some());
    }

    #[test]
    fn sorted_by_type_then_id_descending() {
        let items = vec![
            item(ItemKind::Finished, 2, "Cake", 1, None),
            item(ItemKind::Raw, 1, "Flour", 1, None),
            item(ItemKind::Raw, 3, "Sugar", 1, None),
            item(ItemKind::Finished, 5, "Bread", 1, None),
        ];
        let out = InventoryFilter::default().apply(items);
        let codes: Vec<&str> = out.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["RM-0003", "RM-0001", "FG-0005", "FG-0002"]);
    }

    #[test]
    fn filters_combine() {
        let items = vec![
            item(ItemKind::Raw, 1, "Flour", 0, None),
            item(ItemKind::Raw, 2, "Sugar", 10, Some(20)),
            item(ItemKind::Finished, 3, "Sugar cookies", 4, None),
        ];
        let f = InventoryFilter {
            search: Some("  SUGAR ".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(items.clone()).len(), 2);

        let f = InventoryFilter {
            kind: Some(ItemKind::Raw),
            in_stock_only: true,
            ..Default::default()
        };
        let out = f.apply(items.clone());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, StockStatus::Low);

        let f = InventoryFilter {
            search: Some("fg-0003".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(items).len(), 1);
    }

    #[test]
    fn filter_parses_query_names() {
        let f: InventoryFilter = serde_json::from_value(json!({ "type": "Finished", "status": "OK", "inStockOnly": true })).unwrap();
        assert_eq!(f.kind, Some(ItemKind::Finished));
        assert_eq!(f.status, Some(StockStatus::Ok));
        assert!(f.in_stock_only);
    }
}
