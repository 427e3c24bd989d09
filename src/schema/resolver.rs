//! Resolve logical table and column names against whatever schema variant is deployed.
//! Every call reads the catalog afresh.

use crate::error::{AppError, SchemaError};
use crate::schema::catalog::SchemaCatalog;
use crate::schema::category::parse_enum_descriptor;
use std::collections::{BTreeMap, HashMap};

/// Logical key and its physical candidates, in priority order.
pub type FieldRequest<'a> = (&'a str, &'a [&'a str]);

/// Logical key → physical column name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap(BTreeMap<String, String>);

impl ColumnMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: ColumnMap) {
        self.0.extend(other.0);
    }
}

/// Case-insensitive index over existing names. An exact-case name wins over a
/// differently-cased twin; otherwise the first one listed does.
struct NameIndex<'a> {
    exact: HashMap<&'a str, &'a str>,
    folded: HashMap<String, &'a str>,
}

impl<'a> NameIndex<'a> {
    fn new(existing: &'a [String]) -> Self {
        let mut folded = HashMap::new();
        let mut exact = HashMap::new();
        for name in existing {
            exact.insert(name.as_str(), name.as_str());
            folded.entry(name.to_lowercase()).or_insert(name.as_str());
        }
        NameIndex { exact, folded }
    }

    fn lookup(&self, candidate: &str) -> Option<&'a str> {
        self.exact
            .get(candidate)
            .or_else(|| self.folded.get(&candidate.to_lowercase()))
            .copied()
    }

    fn first_of(&self, candidates: &[&str]) -> Option<&'a str> {
        candidates.iter().find_map(|c| self.lookup(c))
    }
}

/// First candidate (caller order) that names an existing table, in its stored casing.
pub fn pick_table(existing: &[String], candidates: &[&str]) -> Option<String> {
    NameIndex::new(existing).first_of(candidates).map(str::to_string)
}

/// All-or-nothing column resolution; the error lists every unmatched key.
pub fn pick_columns(table: &str, existing: &[String], wanted: &[FieldRequest<'_>]) -> Result<ColumnMap, SchemaError> {
    let index = NameIndex::new(existing);
    let mut out = BTreeMap::new();
    let mut missing = Vec::new();
    for (key, candidates) in wanted {
        match index.first_of(candidates) {
            Some(found) => {
                out.insert(key.to_string(), found.to_string());
            }
            None => missing.push(key.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            table: table.to_string(),
            keys: missing,
        });
    }
    Ok(ColumnMap(out))
}

/// Optional probe: only the keys that resolve. Never used for fields a caller requires.
pub fn pick_present(existing: &[String], wanted: &[FieldRequest<'_>]) -> ColumnMap {
    let index = NameIndex::new(existing);
    ColumnMap(
        wanted
            .iter()
            .filter_map(|(key, candidates)| index.first_of(candidates).map(|c| (key.to_string(), c.to_string())))
            .collect(),
    )
}

/// Enumerated column with its allowed literals and the cast for binding values to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumColumn {
    pub literals: Vec<String>,
    /// `None` when the column is not an enumeration.
    pub cast: Option<String>,
}

impl EnumColumn {
    pub fn is_enum(&self) -> bool {
        self.cast.is_some()
    }
}

pub struct SchemaResolver<C> {
    catalog: C,
}

impl<C: SchemaCatalog> SchemaResolver<C> {
    pub fn new(catalog: C) -> Self {
        SchemaResolver { catalog }
    }

    pub fn schema_name(&self) -> &str {
        self.catalog.schema_name()
    }

    pub async fn resolve_table(&self, candidates: &[&str]) -> Result<String, AppError> {
        self.find_table(candidates).await?.ok_or_else(|| {
            SchemaError::TableNotFound {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            }
            .into()
        })
    }

    /// Like `resolve_table` for tables that may legitimately be absent.
    pub async fn find_table(&self, candidates: &[&str]) -> Result<Option<String>, AppError> {
        let existing = self.catalog.table_names().await?;
        let found = pick_table(&existing, candidates);
        tracing::debug!(?candidates, ?found, "resolve table");
        Ok(found)
    }

    pub async fn resolve_columns(&self, table: &str, wanted: &[FieldRequest<'_>]) -> Result<ColumnMap, AppError> {
        let existing = self.catalog.column_names(table).await?;
        Ok(pick_columns(table, &existing, wanted)?)
    }

    pub async fn probe_columns(&self, table: &str, wanted: &[FieldRequest<'_>]) -> Result<ColumnMap, AppError> {
        let existing = self.catalog.column_names(table).await?;
        Ok(pick_present(&existing, wanted))
    }

    /// Declared literals of an enumerated column; empty when the column is not one.
    pub async fn enum_values(&self, table: &str, column: &str) -> Result<Vec<String>, AppError> {
        Ok(self.enum_column(table, column).await?.literals)
    }

    pub async fn enum_column(&self, table: &str, column: &str) -> Result<EnumColumn, AppError> {
        let ty = self.catalog.column_type(table, column).await?;
        let parsed = ty
            .as_ref()
            .and_then(|t| parse_enum_descriptor(&t.descriptor).map(|lits| (lits, t.cast.clone())));
        Ok(match parsed {
            Some((literals, cast)) => EnumColumn {
                literals,
                cast: Some(cast),
            },
            None => EnumColumn {
                literals: Vec::new(),
                cast: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::StaticCatalog;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_matching_candidate_wins_not_alphabetical() {
        let existing = names(&["raw_materials", "RawMaterials"]);
        assert_eq!(pick_table(&existing, &["rawmaterials", "raw_materials"]).as_deref(), Some("RawMaterials"));
        assert_eq!(pick_table(&existing, &["raw_materials", "RawMaterials"]).as_deref(), Some("raw_materials"));
    }

    #[test]
    fn table_match_preserves_stored_casing() {
        let existing = names(&["FinishedGoods"]);
        assert_eq!(pick_table(&existing, &["finishedgoods"]).as_deref(), Some("FinishedGoods"));
        assert_eq!(pick_table(&existing, &["finished_products"]), None);
    }

    #[test]
    fn exact_case_beats_a_differently_cased_twin() {
        let existing = names(&["Users", "users"]);
        assert_eq!(pick_table(&existing, &["users"]).as_deref(), Some("users"));
        assert_eq!(pick_table(&existing, &["USERS"]).as_deref(), Some("Users"));
    }

    #[test]
    fn columns_resolve_by_priority_in_stored_casing() {
        let existing = names(&["materialsid", "Quantity", "MaterialQuantity"]);
        let map = pick_columns(
            "RawMaterials",
            &existing,
            &[
                ("id", &["MaterialID", "MaterialsId"]),
                ("quantity", &["MaterialQuantity", "Quantity"]),
            ],
        )
        .unwrap();
        assert_eq!(map.get("id"), Some("materialsid"));
        assert_eq!(map.get("quantity"), Some("MaterialQuantity"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn every_missing_key_is_reported() {
        let existing = names(&["id", "name"]);
        let err = pick_columns(
            "t",
            &existing,
            &[
                ("id", &["id"]),
                ("low", &["Lowstock", "low_stock"]),
                ("name", &["name"]),
                ("unit", &["Unit"]),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                table: "t".into(),
                keys: vec!["low".into(), "unit".into()],
            }
        );
    }

    #[test]
    fn probe_returns_only_present_keys() {
        let existing = names(&["PhoneNumber"]);
        let map = pick_present(&existing, &[("phone", &["PhoneNumber"]), ("role_id", &["RoleID"])]);
        assert!(map.contains("phone"));
        assert!(!map.contains("role_id"));
    }

    #[tokio::test]
    async fn resolver_reads_catalog() {
        let catalog = StaticCatalog::default()
            .with_table("inventory_transactions", &["TransactionID", "Qty"])
            .with_typed_column("inventory_transactions", "ItemType", "enum('RawMaterial','FinishedProduct')");
        let r = SchemaResolver::new(catalog);

        let table = r
            .resolve_table(&["InventoryTransactions", "inventory_transactions"])
            .await
            .unwrap();
        assert_eq!(table, "inventory_transactions");

        let cols = r
            .resolve_columns(&table, &[("id", &["TransactionID"]), ("itemType", &["ItemType", "item_type"])])
            .await
            .unwrap();
        assert_eq!(cols.get("itemType"), Some("ItemType"));

        let values = r.enum_values(&table, "ItemType").await.unwrap();
        assert_eq!(values, vec!["RawMaterial", "FinishedProduct"]);
        assert!(r.enum_values(&table, "Qty").await.unwrap().is_empty());
        assert!(!r.enum_column(&table, "Qty").await.unwrap().is_enum());
    }

    #[tokio::test]
    async fn missing_table_is_a_distinct_failure() {
        let r = SchemaResolver::new(StaticCatalog::default().with_table("other", &["id"]));
        let err = r.resolve_table(&["users", "user"]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Schema(SchemaError::TableNotFound { ref candidates }) if candidates == &["users", "user"]
        ));
        assert_eq!(r.find_table(&["users"]).await.unwrap(), None);
    }
}
