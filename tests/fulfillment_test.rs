//! Integration tests for the fulfillment engine: partial line fulfillment,
//! extra returnable units, bulk all-or-nothing shipment and the single-shot
//! full-order path.

mod common;

use common::{seed_item, seed_order_with_line, seed_stock, setup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::fulfillment::FulfillItemRequest;
use stockroom_api::services::orders::AddOrderItemRequest;

fn fulfill(order_item_id: uuid::Uuid, quantity: Decimal) -> FulfillItemRequest {
    FulfillItemRequest {
        order_item_id,
        fulfill_quantity: quantity,
        extra_quantity: Decimal::ZERO,
        expected_return_date: None,
        remarks: None,
    }
}

#[tokio::test]
async fn partial_fulfillment_moves_the_order_to_processing() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-001", false).await;
    seed_stock(&ctx, item.id, dec!(100)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let result = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(4)), ctx.user_id)
        .await
        .expect("fulfill item");
    assert_eq!(result.order_status, "PROCESSING");

    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.items[0].fulfilled_quantity, dec!(4));
    assert_eq!(detail.items[0].remaining_quantity, dec!(6));
    assert_eq!(detail.items[0].status, "PARTIAL");

    // The shipment debited stock immediately (no pending step).
    let stock = ctx
        .services
        .stock_ledger
        .get_stock(item.id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(96));
    assert_eq!(stock.available_quantity, dec!(96));

    let txn = ctx
        .services
        .transactions
        .get_transaction(result.transaction_id)
        .await
        .expect("get transaction");
    assert_eq!(txn.status, "CONFIRMED");
    assert_eq!(txn.transaction_sub_type, "ORDER_FULFILLMENT");
    assert_eq!(txn.reference_number.as_deref(), Some(order.order_number.as_str()));
    assert_eq!(txn.unit_cost, dec!(3.00));
}

#[tokio::test]
async fn completing_the_only_line_fulfills_the_order() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-002", false).await;
    seed_stock(&ctx, item.id, dec!(50)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let result = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(10)), ctx.user_id)
        .await
        .expect("fulfill full quantity");
    assert_eq!(result.order_status, "FULFILLED");

    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.order.status, "FULFILLED");
    assert_eq!(detail.items[0].status, "FULFILLED");
    assert_eq!(detail.items[0].remaining_quantity, Decimal::ZERO);
}

#[tokio::test]
async fn fulfillment_is_blocked_once_the_order_leaves_pending() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-003", false).await;
    seed_stock(&ctx, item.id, dec!(50)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    // First partial fulfillment succeeds and moves the order to PROCESSING.
    let result = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(4)), ctx.user_id)
        .await
        .expect("first fulfillment");
    assert_eq!(result.order_status, "PROCESSING");

    // Any further fulfillment on the same order is rejected.
    let err = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(2)), ctx.user_id)
        .await
        .expect_err("order no longer pending");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn fulfillment_beyond_remaining_is_rejected() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-004", false).await;
    seed_stock(&ctx, item.id, dec!(100)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let err = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(11)), ctx.user_id)
        .await
        .expect_err("over-fulfillment");
    match err {
        ServiceError::ExceedsRemaining {
            requested,
            remaining,
        } => {
            assert_eq!(requested, dec!(11));
            assert_eq!(remaining, dec!(10));
        }
        other => panic!("expected ExceedsRemaining, got {other:?}"),
    }
}

#[tokio::test]
async fn fulfillment_fails_cleanly_on_insufficient_stock() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-005", false).await;
    seed_stock(&ctx, item.id, dec!(3)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let err = ctx
        .services
        .fulfillment
        .fulfill_item(order.id, fulfill(line.id, dec!(5)), ctx.user_id)
        .await
        .expect_err("not enough stock");
    match err {
        ServiceError::InsufficientStock(shortages) => {
            assert_eq!(shortages[0].requested, dec!(5));
            assert_eq!(shortages[0].available, dec!(3));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing was written: no progress, no debit, order still PENDING.
    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.order.status, "PENDING");
    assert_eq!(detail.items[0].fulfilled_quantity, Decimal::ZERO);
    let stock = ctx
        .services
        .stock_ledger
        .get_stock(item.id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(3));
}

#[tokio::test]
async fn extra_quantity_records_a_return_obligation() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-006", true).await;
    seed_stock(&ctx, item.id, dec!(100)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let result = ctx
        .services
        .fulfillment
        .fulfill_item(
            order.id,
            FulfillItemRequest {
                order_item_id: line.id,
                fulfill_quantity: dec!(10),
                extra_quantity: dec!(2),
                expected_return_date: None,
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("fulfill with extra");
    assert_eq!(result.order_status, "FULFILLED");

    // 12 units left the warehouse, 2 of them owed back.
    let stock = ctx
        .services
        .stock_ledger
        .get_stock(item.id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(88));
    assert_eq!(stock.returnable_quantity, dec!(2));

    let txn = ctx
        .services
        .transactions
        .get_transaction(result.transaction_id)
        .await
        .expect("get transaction");
    assert_eq!(txn.quantity, dec!(12));
    assert_eq!(txn.returnable_quantity, dec!(2));
}

#[tokio::test]
async fn extra_quantity_requires_a_returnable_item() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-007", false).await;
    seed_stock(&ctx, item.id, dec!(100)).await;
    let (order, line) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let err = ctx
        .services
        .fulfillment
        .fulfill_item(
            order.id,
            FulfillItemRequest {
                order_item_id: line.id,
                fulfill_quantity: dec!(5),
                extra_quantity: dec!(1),
                expected_return_date: None,
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect_err("extra on non-returnable item");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn bulk_fulfill_is_all_or_nothing() {
    let ctx = setup().await;
    let item_a = seed_item(&ctx, "WID-008", false).await;
    let item_b = seed_item(&ctx, "WID-009", false).await;
    seed_stock(&ctx, item_a.id, dec!(100)).await;
    seed_stock(&ctx, item_b.id, dec!(2)).await;

    let (order, _) = seed_order_with_line(&ctx, item_a.id, dec!(10), dec!(3.00)).await;
    ctx.services
        .orders
        .add_item(
            order.id,
            AddOrderItemRequest {
                item_id: item_b.id,
                requested_quantity: dec!(5),
                unit_price: dec!(7.00),
            },
        )
        .await
        .expect("add second line");

    let err = ctx
        .services
        .fulfillment
        .bulk_fulfill(order.id, ctx.user_id)
        .await
        .expect_err("one line short");
    match err {
        ServiceError::InsufficientStock(shortages) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].item_code, "WID-009");
            assert_eq!(shortages[0].requested, dec!(5));
            assert_eq!(shortages[0].available, dec!(2));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Neither line shipped anything.
    let stock_a = ctx
        .services
        .stock_ledger
        .get_stock(item_a.id)
        .await
        .expect("get stock a");
    assert_eq!(stock_a.current_quantity, dec!(100));
    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.order.status, "PENDING");

    // With stock topped up the same call ships everything.
    seed_stock(&ctx, item_b.id, dec!(20)).await;
    let result = ctx
        .services
        .fulfillment
        .bulk_fulfill(order.id, ctx.user_id)
        .await
        .expect("bulk fulfill");
    assert_eq!(result.order_status, "FULFILLED");
    assert_eq!(result.fulfilled_items.len(), 2);

    let detail = ctx.services.orders.get_order(order.id).await.expect("get order");
    assert_eq!(detail.order.status, "FULFILLED");
    assert!(detail
        .items
        .iter()
        .all(|line| line.remaining_quantity == Decimal::ZERO));
}

#[tokio::test]
async fn fulfill_order_checks_full_requested_quantities() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-010", false).await;
    seed_stock(&ctx, item.id, dec!(8)).await;
    let (order, _) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let err = ctx
        .services
        .fulfillment
        .fulfill_order(order.id, ctx.user_id)
        .await
        .expect_err("stock below requested");
    match err {
        ServiceError::InsufficientStock(shortages) => {
            assert_eq!(shortages[0].requested, dec!(10));
            assert_eq!(shortages[0].available, dec!(8));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    seed_stock(&ctx, item.id, dec!(10)).await;
    let result = ctx
        .services
        .fulfillment
        .fulfill_order(order.id, ctx.user_id)
        .await
        .expect("fulfill order");
    assert_eq!(result.order_status, "FULFILLED");
    assert_eq!(result.fulfilled_items[0].quantity, dec!(10));

    let stock = ctx
        .services
        .stock_ledger
        .get_stock(item.id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, Decimal::ZERO);
}

#[tokio::test]
async fn pending_fulfillment_queue_reports_remaining_and_availability() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "WID-011", false).await;
    seed_stock(&ctx, item.id, dec!(6)).await;
    let (order, _) = seed_order_with_line(&ctx, item.id, dec!(10), dec!(3.00)).await;

    let queue = ctx
        .services
        .orders
        .pending_fulfillment()
        .await
        .expect("pending fulfillment");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, order.id);
    assert_eq!(queue[0].items[0].remaining_quantity, dec!(10));
    assert_eq!(queue[0].items[0].available_quantity, dec!(6));

    // Fulfilled orders drop out of the queue.
    seed_stock(&ctx, item.id, dec!(10)).await;
    ctx.services
        .fulfillment
        .fulfill_order(order.id, ctx.user_id)
        .await
        .expect("fulfill order");
    let queue = ctx
        .services
        .orders
        .pending_fulfillment()
        .await
        .expect("pending fulfillment");
    assert!(queue.is_empty());
}
