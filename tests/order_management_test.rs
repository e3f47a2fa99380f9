//! Integration tests for order creation, line management and guarded
//! deletion.

mod common;

use common::{seed_item, seed_order_with_line, seed_stock, setup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use stockroom_api::entities::{inventory_transaction, order, order_item};
use stockroom_api::errors::ServiceError;
use stockroom_api::services::orders::{AddOrderItemRequest, CreateOrderRequest};

#[tokio::test]
async fn new_orders_start_pending_with_a_zero_total() {
    let ctx = setup().await;

    let order = ctx
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_name: "Acme Corp".to_string(),
                customer_contact: "orders@acme.test".to_string(),
                expected_delivery_date: None,
                notes: Some("Rush".to_string()),
            },
            ctx.user_id,
        )
        .await
        .expect("create order");

    assert!(order.order_number.starts_with("ORD"));
    assert_eq!(order.status, "PENDING");
    assert_eq!(order.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn order_numbers_are_unique() {
    let ctx = setup().await;
    let request = || CreateOrderRequest {
        customer_name: "Acme Corp".to_string(),
        customer_contact: "orders@acme.test".to_string(),
        expected_delivery_date: None,
        notes: None,
    };

    let a = ctx
        .services
        .orders
        .create_order(request(), ctx.user_id)
        .await
        .expect("first order");
    let b = ctx
        .services
        .orders
        .create_order(request(), ctx.user_id)
        .await
        .expect("second order");
    assert_ne!(a.order_number, b.order_number);
}

#[tokio::test]
async fn adding_lines_rolls_into_the_order_total() {
    let ctx = setup().await;
    let item_a = seed_item(&ctx, "ORD-ITM-001", false).await;
    let item_b = seed_item(&ctx, "ORD-ITM-002", false).await;

    let (order, line) = seed_order_with_line(&ctx, item_a.id, dec!(3), dec!(2.50)).await;
    assert_eq!(line.total_price, dec!(7.50));
    assert_eq!(line.status, "PENDING");
    assert_eq!(line.remaining_quantity, dec!(3));

    ctx.services
        .orders
        .add_item(
            order.id,
            AddOrderItemRequest {
                item_id: item_b.id,
                requested_quantity: dec!(2),
                unit_price: dec!(10.00),
            },
        )
        .await
        .expect("add second line");

    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.order.total_amount, dec!(27.50));
    assert_eq!(detail.items.len(), 2);
}

#[tokio::test]
async fn lines_cannot_be_added_once_the_order_leaves_pending() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "ORD-ITM-003", false).await;
    seed_stock(&ctx, item.id, dec!(10)).await;
    let (order, _) = seed_order_with_line(&ctx, item.id, dec!(5), dec!(1.00)).await;

    ctx.services
        .fulfillment
        .fulfill_order(order.id, ctx.user_id)
        .await
        .expect("fulfill order");

    let err = ctx
        .services
        .orders
        .add_item(
            order.id,
            AddOrderItemRequest {
                item_id: item.id,
                requested_quantity: dec!(1),
                unit_price: dec!(1.00),
            },
        )
        .await
        .expect_err("add to fulfilled order");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn deleting_a_pending_order_cascades_lines_and_pending_transactions() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "ORD-ITM-004", false).await;
    let (order, _) = seed_order_with_line(&ctx, item.id, dec!(5), dec!(1.00)).await;

    let order_number = ctx
        .services
        .orders
        .delete_order(order.id)
        .await
        .expect("delete order");
    assert_eq!(order_number, order.order_number);

    let err = ctx
        .services
        .orders
        .get_order(order.id)
        .await
        .expect_err("order gone");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let orphans = order_item::Entity::find()
        .all(ctx.db.as_ref())
        .await
        .expect("scan order items");
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn orders_with_confirmed_transactions_cannot_be_deleted() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "ORD-ITM-005", false).await;
    seed_stock(&ctx, item.id, dec!(20)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(5), dec!(1.00)).await;

    // Partial fulfillment writes a confirmed transaction against the order.
    ctx.services
        .fulfillment
        .fulfill_item(
            order.id,
            stockroom_api::services::fulfillment::FulfillItemRequest {
                order_item_id: line.id,
                fulfill_quantity: dec!(2),
                extra_quantity: Decimal::ZERO,
                expected_return_date: None,
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("partial fulfillment");

    // The PROCESSING status alone blocks deletion.
    let err = ctx
        .services
        .orders
        .delete_order(order.id)
        .await
        .expect_err("delete shipped order");
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Even a CANCELLED order keeps its shipment history: the confirmed
    // transaction makes it undeletable.
    let mut active: order::ActiveModel = order::Entity::find_by_id(order.id)
        .one(ctx.db.as_ref())
        .await
        .expect("load order")
        .expect("order exists")
        .into();
    active.status = Set("CANCELLED".to_string());
    active.update(ctx.db.as_ref()).await.expect("cancel order");

    let err = ctx
        .services
        .orders
        .delete_order(order.id)
        .await
        .expect_err("delete cancelled order with shipments");
    assert!(matches!(err, ServiceError::HasConfirmedTransactions(_)));

    let shipped = inventory_transaction::Entity::find()
        .all(ctx.db.as_ref())
        .await
        .expect("scan transactions");
    assert!(!shipped.is_empty());
}

#[tokio::test]
async fn fulfilled_orders_are_not_deletable() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "ORD-ITM-006", false).await;
    seed_stock(&ctx, item.id, dec!(10)).await;
    let (order, _) = seed_order_with_line(&ctx, item.id, dec!(5), dec!(1.00)).await;

    ctx.services
        .fulfillment
        .fulfill_order(order.id, ctx.user_id)
        .await
        .expect("fulfill order");

    let err = ctx
        .services
        .orders
        .delete_order(order.id)
        .await
        .expect_err("delete fulfilled order");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn list_orders_filters_by_status() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "ORD-ITM-007", false).await;
    seed_stock(&ctx, item.id, dec!(10)).await;

    let (fulfilled_order, _) = seed_order_with_line(&ctx, item.id, dec!(5), dec!(1.00)).await;
    ctx.services
        .fulfillment
        .fulfill_order(fulfilled_order.id, ctx.user_id)
        .await
        .expect("fulfill order");
    let (pending_order, _) = seed_order_with_line(&ctx, item.id, dec!(2), dec!(1.00)).await;

    let pending = ctx
        .services
        .orders
        .list_orders(Some("PENDING".to_string()))
        .await
        .expect("list pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, pending_order.id);

    let all = ctx.services.orders.list_orders(None).await.expect("list all");
    assert_eq!(all.len(), 2);
}
