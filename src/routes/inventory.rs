//! Stock, inventory view, transactions and users.

use crate::handlers::{inventory, stock, transactions, users};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/raw-materials", get(stock::list_raw).post(stock::create_raw))
        .route(
            "/api/raw-materials/:id",
            get(stock::read_raw).put(stock::update_raw).delete(stock::delete_raw),
        )
        .route("/api/finished-goods", get(stock::list_finished).post(stock::create_finished))
        .route(
            "/api/finished-goods/:id",
            get(stock::read_finished)
                .put(stock::update_finished)
                .delete(stock::delete_finished),
        )
        .route("/api/inventory", get(inventory::list_inventory))
        .route("/api/transactions", get(transactions::list).post(transactions::create))
        .route(
            "/api/transactions/:id",
            get(transactions::read).put(transactions::update).delete(transactions::delete),
        )
        .route("/api/inventory_transactions", get(transactions::list).post(transactions::create))
        .route(
            "/api/inventory_transactions/:id",
            get(transactions::read).put(transactions::update).delete(transactions::delete),
        )
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::read).put(users::update).delete(users::delete))
}
