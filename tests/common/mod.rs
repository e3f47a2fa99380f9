//! Shared harness for integration tests: an in-memory SQLite database with
//! the full migration set applied and the service layer wired up.
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use stockroom_api::db::{self, DbConfig, DbPool};
use stockroom_api::entities::item;
use stockroom_api::events::{self, EventSender};
use stockroom_api::handlers::AppServices;
use stockroom_api::services::orders::{
    AddOrderItemRequest, CreateOrderRequest, OrderItemResponse, OrderResponse,
};
use stockroom_api::services::transactions::CreateTransactionRequest;

pub struct TestCtx {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub user_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

/// Fresh application state backed by an in-memory SQLite database. A single
/// pooled connection keeps the in-memory database alive across calls.
pub async fn setup() -> TestCtx {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("test database");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);

    let (tx, rx) = mpsc::channel(64);
    let event_task = tokio::spawn(events::process_events(rx));
    let services = AppServices::new(db.clone(), Arc::new(EventSender::new(tx)));

    TestCtx {
        db,
        services,
        user_id: Uuid::new_v4(),
        _event_task: event_task,
    }
}

/// Inserts an item master row directly; the service layer never creates
/// items.
pub async fn seed_item(ctx: &TestCtx, code: &str, returnable: bool) -> item::Model {
    item::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_code: Set(code.to_string()),
        item_name: Set(format!("Test item {code}")),
        description: Set(None),
        unit_of_measure: Set("EA".to_string()),
        min_stock_level: Set(Decimal::ZERO),
        max_stock_level: Set(Decimal::from(1_000)),
        standard_cost: Set(Decimal::new(500, 2)),
        is_returnable: Set(returnable),
        is_active: Set(true),
        created_by: Set(None),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(ctx.db.as_ref())
    .await
    .expect("seed item")
}

/// Brings an item's current stock to `quantity` through a confirmed
/// stock-take adjustment, exercising the same path production uses.
pub async fn seed_stock(ctx: &TestCtx, item_id: Uuid, quantity: Decimal) {
    let pending = ctx
        .services
        .transactions
        .create_transaction(
            CreateTransactionRequest {
                item_id,
                transaction_type: "ADJUST".to_string(),
                transaction_sub_type: "STOCK_TAKE".to_string(),
                quantity,
                returnable_quantity: Decimal::ZERO,
                unit_cost: Decimal::ZERO,
                reference_number: None,
                vendor_customer: None,
                remarks: Some("Initial stock".to_string()),
                expected_return_date: None,
            },
            ctx.user_id,
        )
        .await
        .expect("create stock take");
    ctx.services
        .transactions
        .confirm_transaction(pending.id, ctx.user_id)
        .await
        .expect("confirm stock take");
}

/// Creates a PENDING order with a single line for `item_id`.
pub async fn seed_order_with_line(
    ctx: &TestCtx,
    item_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
) -> (OrderResponse, OrderItemResponse) {
    let order = ctx
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_name: "Acme Corp".to_string(),
                customer_contact: "orders@acme.test".to_string(),
                expected_delivery_date: None,
                notes: None,
            },
            ctx.user_id,
        )
        .await
        .expect("create order");

    let line = ctx
        .services
        .orders
        .add_item(
            order.id,
            AddOrderItemRequest {
                item_id,
                requested_quantity: quantity,
                unit_price,
            },
        )
        .await
        .expect("add order line");

    (order, line)
}
