//! Schema resolution: map logical table/column names onto the deployed database.

pub mod catalog;
pub mod category;
pub mod layout;
pub mod resolver;

pub use catalog::{ColumnType, PgCatalog, SchemaCatalog};
pub use category::{coerce_category, parse_enum_descriptor, CategoryGroup};
pub use layout::{TableMap, TableSpec, FINISHED_GOODS, RAW_MATERIALS, ROLES, TRANSACTIONS, USERS};
pub use resolver::{pick_columns, pick_table, ColumnMap, EnumColumn, FieldRequest, SchemaResolver};
