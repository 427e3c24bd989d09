//! Known naming variants of the inventory tables.

use crate::error::{AppError, SchemaError};
use crate::schema::catalog::SchemaCatalog;
use crate::schema::resolver::{ColumnMap, FieldRequest, SchemaResolver};

/// Table candidates plus the logical fields every variant must provide.
pub struct TableSpec {
    pub tables: &'static [&'static str],
    pub fields: &'static [FieldRequest<'static>],
    /// Probed, not required.
    pub optional: &'static [FieldRequest<'static>],
}

const LOW_STOCK: &[&str] = &["Lowstock", "lowstock", "low_stock", "low", "LowStock"];
const UPDATED_AT: &[&str] = &["TimeUpdate", "time_update", "updated_at", "update_time", "timestamp"];

pub const RAW_MATERIALS: TableSpec = TableSpec {
    tables: &["RawMaterials", "raw_materials"],
    fields: &[
        ("id", &["MaterialID", "material_id", "id", "MaterialsId", "materials_id", "materialsId"]),
        ("name", &["MaterialName", "material_name", "name", "MaterialsName", "materials_name", "materialsName"]),
        ("quantity", &["MaterialQuantity", "material_quantity", "Quantity", "quantity"]),
        ("low", LOW_STOCK),
        ("unit", &["Unit", "unit"]),
        ("time", UPDATED_AT),
    ],
    optional: &[],
};

pub const FINISHED_GOODS: TableSpec = TableSpec {
    tables: &["FinishedGoods", "finished_products"],
    fields: &[
        ("id", &["GoodsID", "goods_id", "id", "ProductId", "product_id", "productId"]),
        ("name", &["FinishedGoodsName", "finished_goods_name", "name", "ProductName", "product_name", "productName"]),
        ("quantity", &["FinishedGoodsQuantity", "finished_goods_quantity", "Quantity", "quantity"]),
        ("low", LOW_STOCK),
        ("time", UPDATED_AT),
    ],
    optional: &[],
};

pub const TRANSACTIONS: TableSpec = TableSpec {
    tables: &["inventory_transactions", "InventoryTransactions", "transactions", "Transactions"],
    fields: &[
        ("id", &["TransactionID", "transaction_id", "id"]),
        ("txType", &["TransactionType", "transaction_type", "Type"]),
        ("itemType", &["ItemType", "item_type"]),
        ("materialsId", &["MaterialsId", "MaterialID", "material_id", "materials_id"]),
        ("productId", &["ProductId", "product_id", "GoodsID", "goods_id"]),
        ("qty", &["Qty", "Quantity", "quantity", "qty"]),
        ("beforeQty", &["BeforeQty", "before_qty"]),
        ("afterQty", &["AfterQty", "after_qty"]),
        ("note", &["Note", "note", "Description", "description"]),
        ("changedBy", &["ChangedBy", "UserID", "changed_by"]),
        ("time", &["TimeUpdate", "time_update", "updated_at", "timestamp", "CreatedAt", "created_at"]),
    ],
    optional: &[],
};

pub const USERS: TableSpec = TableSpec {
    tables: &["users", "user"],
    fields: &[
        ("id", &["UserID", "user_id", "id"]),
        ("username", &["UserName", "Username", "username", "user_name"]),
        ("email", &["Email", "email"]),
        ("password_hash", &["PasswordHash", "password_hash", "Password"]),
    ],
    optional: &[
        ("phone", &["PhoneNumber", "Phonenumber", "phone_number", "phone"]),
        ("birthdate", &["BirthDate", "Birthdate", "birth_date", "birthdate"]),
        ("role_id", &["RoleID", "role_id"]),
        ("is_active", &["IsActive", "is_active"]),
    ],
};

pub const ROLES: TableSpec = TableSpec {
    tables: &["roles", "Roles"],
    fields: &[("id", &["RoleID", "role_id", "id"]), ("name", &["RoleName", "role_name", "name"])],
    optional: &[],
};

/// A physical table with its resolved logical columns.
#[derive(Clone, Debug)]
pub struct TableMap {
    pub schema: String,
    pub table: String,
    pub columns: ColumnMap,
}

impl TableMap {
    /// Physical column for a logical key this map was resolved with.
    pub fn col(&self, key: &str) -> Result<&str, SchemaError> {
        self.columns.get(key).ok_or_else(|| SchemaError::MissingColumns {
            table: self.table.clone(),
            keys: vec![key.to_string()],
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.columns.contains(key)
    }
}

impl<C: SchemaCatalog> SchemaResolver<C> {
    /// Resolve table and required fields, then fold in whichever optional fields exist.
    pub async fn resolve_spec(&self, spec: &TableSpec) -> Result<TableMap, AppError> {
        let table = self.resolve_table(spec.tables).await?;
        self.map_spec(table, spec).await
    }

    /// Same as `resolve_spec` for tables that may be absent.
    pub async fn find_spec(&self, spec: &TableSpec) -> Result<Option<TableMap>, AppError> {
        match self.find_table(spec.tables).await? {
            Some(table) => Ok(Some(self.map_spec(table, spec).await?)),
            None => Ok(None),
        }
    }

    async fn map_spec(&self, table: String, spec: &TableSpec) -> Result<TableMap, AppError> {
        let mut columns = self.resolve_columns(&table, spec.fields).await?;
        if !spec.optional.is_empty() {
            let present = self.probe_columns(&table, spec.optional).await?;
            columns.extend(present);
        }
        Ok(TableMap {
            schema: self.schema_name().to_string(),
            table,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::StaticCatalog;

    #[tokio::test]
    async fn snake_case_raw_materials_variant_resolves() {
        let catalog = StaticCatalog::default().with_table(
            "raw_materials",
            &["materials_id", "materials_name", "quantity", "low_stock", "unit", "updated_at"],
        );
        let map = SchemaResolver::new(catalog).resolve_spec(&RAW_MATERIALS).await.unwrap();
        assert_eq!(map.table, "raw_materials");
        assert_eq!(map.col("id").unwrap(), "materials_id");
        assert_eq!(map.col("low").unwrap(), "low_stock");
    }

    #[tokio::test]
    async fn optional_user_fields_are_probed() {
        let catalog = StaticCatalog::default().with_table(
            "user",
            &["UserID", "Username", "Email", "PasswordHash", "Phonenumber", "RoleID"],
        );
        let map = SchemaResolver::new(catalog).resolve_spec(&USERS).await.unwrap();
        assert_eq!(map.table, "user");
        assert_eq!(map.col("phone").unwrap(), "Phonenumber");
        assert!(map.has("role_id"));
        assert!(!map.has("is_active"));
        assert!(map.col("is_active").is_err());
    }

    #[tokio::test]
    async fn absent_roles_table_is_not_an_error() {
        let catalog = StaticCatalog::default().with_table("users", &["UserID"]);
        assert!(SchemaResolver::new(catalog).find_spec(&ROLES).await.unwrap().is_none());
    }
}
