//! Integration tests for return processing: pending settlements chained to
//! the original OUT movement, outstanding-balance enforcement and the
//! returnable-items view.

mod common;

use common::{seed_item, seed_order_with_line, seed_stock, setup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::fulfillment::FulfillItemRequest;
use stockroom_api::services::returns::ProcessReturnRequest;

/// Ships an order line with `extra` returnable units and hands back the
/// fulfillment transaction id.
async fn ship_with_returnable(
    ctx: &common::TestCtx,
    item_code: &str,
    extra: Decimal,
) -> uuid::Uuid {
    let item = seed_item(ctx, item_code, true).await;
    seed_stock(ctx, item.id, dec!(100)).await;
    let (order, line) = seed_order_with_line(ctx, item.id, dec!(10), dec!(4.00)).await;

    let result = ctx
        .services
        .fulfillment
        .fulfill_item(
            order.id,
            FulfillItemRequest {
                order_item_id: line.id,
                fulfill_quantity: dec!(10),
                extra_quantity: extra,
                expected_return_date: None,
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("ship with returnable units");
    result.transaction_id
}

#[tokio::test]
async fn return_settlement_is_pending_until_confirmed() {
    let ctx = setup().await;
    let original_id = ship_with_returnable(&ctx, "RTN-001", dec!(5)).await;
    let original = ctx
        .services
        .transactions
        .get_transaction(original_id)
        .await
        .expect("get original");

    let settlement = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(3),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("process return");

    assert_eq!(settlement.status, "PENDING");
    assert_eq!(settlement.transaction_type, "IN");
    assert_eq!(settlement.transaction_sub_type, "CUSTOMER_RETURN");
    assert_eq!(
        settlement.reference_number.as_deref(),
        Some(original.transaction_number.as_str())
    );
    assert_eq!(settlement.unit_cost, original.unit_cost);
    assert_eq!(
        settlement.remarks.as_deref(),
        Some("Return - Condition: GOOD.")
    );

    // Nothing credited yet: 100 − 15 shipped = 85, returnable still 5.
    let stock = ctx
        .services
        .stock_ledger
        .get_stock(original.item_id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(85));
    assert_eq!(stock.returnable_quantity, dec!(5));

    // Confirmation credits stock and releases the obligation.
    ctx.services
        .transactions
        .confirm_transaction(settlement.id, ctx.user_id)
        .await
        .expect("confirm settlement");

    let stock = ctx
        .services
        .stock_ledger
        .get_stock(original.item_id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(88));
    assert_eq!(stock.returnable_quantity, dec!(2));
}

#[tokio::test]
async fn return_cannot_exceed_the_outstanding_balance() {
    let ctx = setup().await;
    let original_id = ship_with_returnable(&ctx, "RTN-002", dec!(5)).await;

    // Settle 3 of the 5 first.
    let settlement = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(3),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("first return");
    ctx.services
        .transactions
        .confirm_transaction(settlement.id, ctx.user_id)
        .await
        .expect("confirm first return");

    let err = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(3),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect_err("over the outstanding balance");
    match err {
        ServiceError::ExceedsOutstanding {
            requested,
            outstanding,
        } => {
            assert_eq!(requested, dec!(3));
            assert_eq!(outstanding, dec!(2));
        }
        other => panic!("expected ExceedsOutstanding, got {other:?}"),
    }
}

#[tokio::test]
async fn pending_settlements_do_not_consume_the_outstanding_balance() {
    let ctx = setup().await;
    let original_id = ship_with_returnable(&ctx, "RTN-003", dec!(5)).await;

    // An unconfirmed settlement for 3 leaves the confirmed balance at 5,
    // so a second settlement for 4 is still accepted.
    ctx.services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(3),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("pending settlement");

    ctx.services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(4),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("second settlement against unchanged balance");
}

#[tokio::test]
async fn condition_is_recorded_but_never_changes_the_credit() {
    let ctx = setup().await;
    let original_id = ship_with_returnable(&ctx, "RTN-004", dec!(4)).await;
    let original = ctx
        .services
        .transactions
        .get_transaction(original_id)
        .await
        .expect("get original");

    let settlement = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(4),
                condition: "DAMAGED".to_string(),
                remarks: Some("Crushed packaging".to_string()),
            },
            ctx.user_id,
        )
        .await
        .expect("damaged return");
    assert_eq!(
        settlement.remarks.as_deref(),
        Some("Return - Condition: DAMAGED. Crushed packaging")
    );

    ctx.services
        .transactions
        .confirm_transaction(settlement.id, ctx.user_id)
        .await
        .expect("confirm damaged return");

    // A DAMAGED return credits current stock exactly like a GOOD one.
    let stock = ctx
        .services
        .stock_ledger
        .get_stock(original.item_id)
        .await
        .expect("get stock");
    assert_eq!(stock.current_quantity, dec!(90));
    assert_eq!(stock.returnable_quantity, Decimal::ZERO);
}

#[tokio::test]
async fn returns_require_an_out_original() {
    let ctx = setup().await;
    let item = seed_item(&ctx, "RTN-005", true).await;

    let receipt = ctx
        .services
        .transactions
        .create_transaction(
            stockroom_api::services::transactions::CreateTransactionRequest {
                item_id: item.id,
                transaction_type: "IN".to_string(),
                transaction_sub_type: "PURCHASE".to_string(),
                quantity: dec!(10),
                returnable_quantity: Decimal::ZERO,
                unit_cost: dec!(1.00),
                reference_number: None,
                vendor_customer: None,
                remarks: None,
                expected_return_date: None,
            },
            ctx.user_id,
        )
        .await
        .expect("create receipt");

    let err = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: receipt.id,
                returned_quantity: dec!(1),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect_err("return against an IN movement");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: uuid::Uuid::new_v4(),
                returned_quantity: dec!(1),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect_err("return against a missing transaction");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn returnable_items_reflect_the_settled_balance() {
    let ctx = setup().await;
    let original_id = ship_with_returnable(&ctx, "RTN-006", dec!(5)).await;

    let view = ctx
        .services
        .returns
        .returnable_items()
        .await
        .expect("returnable items");
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].transaction_id, original_id);
    assert_eq!(view[0].total_returnable, dec!(5));
    assert_eq!(view[0].returned_quantity, Decimal::ZERO);
    assert_eq!(view[0].outstanding_quantity, dec!(5));
    assert!(!view[0].is_overdue);

    // Settle everything; the entry disappears from the view.
    let settlement = ctx
        .services
        .returns
        .process_return(
            ProcessReturnRequest {
                transaction_id: original_id,
                returned_quantity: dec!(5),
                condition: "GOOD".to_string(),
                remarks: None,
            },
            ctx.user_id,
        )
        .await
        .expect("settle in full");
    ctx.services
        .transactions
        .confirm_transaction(settlement.id, ctx.user_id)
        .await
        .expect("confirm settlement");

    let view = ctx
        .services
        .returns
        .returnable_items()
        .await
        .expect("returnable items");
    assert!(view.is_empty());
}
