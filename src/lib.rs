//! Stockroom API Library
//!
//! Single-tenant inventory and order management: stock ledger, two-phase
//! inventory transactions, order fulfillment and return processing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All `/api/v1` routes
pub fn api_v1_routes() -> Router<AppState> {
    let items = Router::new()
        .route("/items", get(handlers::items::list_items))
        .route("/items/:id", get(handlers::items::get_item));

    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/pending-fulfillment",
            get(handlers::orders::pending_fulfillment),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/items", post(handlers::orders::add_order_item))
        .route(
            "/orders/:id/fulfill-item",
            post(handlers::orders::fulfill_item),
        )
        .route(
            "/orders/:id/bulk-fulfill",
            post(handlers::orders::bulk_fulfill),
        )
        .route("/orders/:id/fulfill", post(handlers::orders::fulfill_order));

    let inventory = Router::new()
        .route(
            "/inventory/transactions",
            get(handlers::inventory::list_transactions)
                .post(handlers::inventory::create_transaction),
        )
        .route(
            "/inventory/transactions/:id",
            get(handlers::inventory::get_transaction),
        )
        .route(
            "/inventory/transactions/:id/confirm",
            post(handlers::inventory::confirm_transaction),
        )
        .route("/inventory/stock/:item_id", get(handlers::inventory::get_stock))
        .route(
            "/inventory/returnable-items",
            get(handlers::returns::returnable_items),
        )
        .route(
            "/inventory/process-return",
            post(handlers::returns::process_return),
        );

    Router::new()
        .merge(items)
        .merge(orders)
        .merge(inventory)
        .route("/health", get(health_check))
        .route("/status", get(api_status))
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "stockroom-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
