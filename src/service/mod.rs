//! Domain services: each resolves its tables, validates input, and runs safe SQL.

mod exec;
pub mod inventory;
pub mod stock;
pub mod transactions;
pub mod users;
pub mod validation;

pub use exec::SqlExec;
pub use inventory::{InventoryFilter, InventoryItem, InventoryService, ItemKind, StockStatus};
pub use stock::{FinishedGoodsBody, RawMaterialBody, StockInput, StockKind, StockService};
pub use transactions::{TransactionService, TxCreate, TxListQuery, TxUpdate};
pub use users::{Credentials, UserBody, UserItem, UserService};
