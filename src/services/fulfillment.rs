use crate::{
    db::DbPool,
    entities::inventory_transaction::{
        self, TransactionStatus, TransactionSubType, TransactionType,
    },
    entities::item::{Entity as ItemEntity, Model as ItemModel},
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel, OrderItemStatus},
    errors::{ServiceError, StockShortage},
    events::{Event, EventSender},
    services::{numbering, stock_ledger},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct FulfillItemRequest {
    pub order_item_id: Uuid,
    pub fulfill_quantity: Decimal,
    /// Extra units issued beyond the requested quantity, tracked as a
    /// return obligation on returnable items.
    #[serde(default)]
    pub extra_quantity: Decimal,
    pub expected_return_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FulfillItemResponse {
    pub transaction_id: Uuid,
    pub transaction_number: String,
    pub order_status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FulfilledLine {
    pub item_code: String,
    pub quantity: Decimal,
    pub transaction_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FulfillOrderResponse {
    pub fulfilled_items: Vec<FulfilledLine>,
    pub order_status: String,
}

/// The workflow that turns order lines into shipped stock: validates
/// availability, writes pre-confirmed OUT transactions, debits the ledger
/// and advances line/order status, all inside one database transaction per
/// call.
#[derive(Clone)]
pub struct FulfillmentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl FulfillmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Partially fulfills one order line, optionally issuing extra
    /// returnable units on top of the requested quantity.
    #[instrument(skip(self, request), fields(order_item_id = %request.order_item_id))]
    pub async fn fulfill_item(
        &self,
        order_id: Uuid,
        request: FulfillItemRequest,
        fulfilled_by: Uuid,
    ) -> Result<FulfillItemResponse, ServiceError> {
        request.validate()?;
        if request.fulfill_quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Fulfill quantity must be positive".to_string(),
            ));
        }
        if request.extra_quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Extra quantity cannot be negative".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let order = load_pending_order(&txn, order_id).await?;

        let line = OrderItemEntity::find()
            .filter(order_item::Column::Id.eq(request.order_item_id))
            .filter(order_item::Column::OrderId.eq(order.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order item not found".to_string()))?;

        let item = ItemEntity::find_by_id(line.item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        if request.extra_quantity > Decimal::ZERO && !item.is_returnable {
            return Err(ServiceError::ValidationError(format!(
                "Item {} is not returnable; extra quantity not allowed",
                item.item_code
            )));
        }

        let remaining = line.remaining_quantity();
        if request.fulfill_quantity > remaining {
            return Err(ServiceError::ExceedsRemaining {
                requested: request.fulfill_quantity,
                remaining,
            });
        }

        let total_needed = request.fulfill_quantity + request.extra_quantity;
        let available = stock_ledger::available_stock(&txn, item.id).await?;
        if total_needed > available {
            return Err(ServiceError::insufficient_stock(
                &item.item_code,
                total_needed,
                available,
            ));
        }

        let remarks = request
            .remarks
            .unwrap_or_else(|| format!("Order fulfillment for {}", order.order_number));
        let saved = write_fulfillment(
            &txn,
            &order,
            &item,
            total_needed,
            request.extra_quantity,
            line.unit_price,
            remarks,
            request.expected_return_date,
            fulfilled_by,
        )
        .await?;

        let new_fulfilled = line.fulfilled_quantity + request.fulfill_quantity;
        let new_returnable = line.returnable_quantity + request.extra_quantity;
        let requested = line.requested_quantity;
        let mut active: order_item::ActiveModel = line.into();
        active.fulfilled_quantity = Set(new_fulfilled);
        active.returnable_quantity = Set(new_returnable);
        active.status = Set(OrderItemStatus::derive(new_fulfilled, requested)
            .as_str()
            .to_string());
        active.update(&txn).await?;

        let order_status = recompute_order_status(&txn, order).await?;

        txn.commit().await?;

        info!(
            transaction_number = %saved.transaction_number,
            fulfill_quantity = %request.fulfill_quantity,
            extra_quantity = %request.extra_quantity,
            order_status = order_status.as_str(),
            "Fulfilled order item"
        );
        if order_status == OrderStatus::Fulfilled {
            self.emit(Event::OrderFulfilled(order_id)).await;
        }

        Ok(FulfillItemResponse {
            transaction_id: saved.id,
            transaction_number: saved.transaction_number,
            order_status: order_status.as_str().to_string(),
        })
    }

    /// Fulfills every outstanding line of an order in one shot. The stock
    /// pre-check runs across all lines before anything is written: if any
    /// line's remaining quantity exceeds its available stock, the whole
    /// call fails with the complete shortage list and nothing changes.
    #[instrument(skip(self))]
    pub async fn bulk_fulfill(
        &self,
        order_id: Uuid,
        fulfilled_by: Uuid,
    ) -> Result<FulfillOrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = load_pending_order(&txn, order_id).await?;
        let lines = load_lines(&txn, order.id).await?;

        let mut shortages = Vec::new();
        for (line, item) in &lines {
            let remaining = line.remaining_quantity();
            if remaining > Decimal::ZERO {
                let available = stock_ledger::available_stock(&txn, line.item_id).await?;
                if remaining > available {
                    shortages.push(StockShortage {
                        item_code: item.item_code.clone(),
                        requested: remaining,
                        available,
                    });
                }
            }
        }
        if !shortages.is_empty() {
            return Err(ServiceError::InsufficientStock(shortages));
        }

        let mut fulfilled_items = Vec::new();
        for (line, item) in lines {
            let remaining = line.remaining_quantity();
            if remaining <= Decimal::ZERO {
                continue;
            }

            let saved = write_fulfillment(
                &txn,
                &order,
                &item,
                remaining,
                Decimal::ZERO,
                line.unit_price,
                format!("Bulk fulfillment for {}", order.order_number),
                None,
                fulfilled_by,
            )
            .await?;

            let requested = line.requested_quantity;
            let mut active: order_item::ActiveModel = line.into();
            active.fulfilled_quantity = Set(requested);
            active.status = Set(OrderItemStatus::Fulfilled.as_str().to_string());
            active.update(&txn).await?;

            fulfilled_items.push(FulfilledLine {
                item_code: item.item_code,
                quantity: remaining,
                transaction_number: saved.transaction_number,
            });
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Fulfilled.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;

        info!(%order_id, lines = fulfilled_items.len(), "Bulk-fulfilled order");
        self.emit(Event::OrderFulfilled(order_id)).await;

        Ok(FulfillOrderResponse {
            fulfilled_items,
            order_status: OrderStatus::Fulfilled.as_str().to_string(),
        })
    }

    /// Single-shot full fulfillment: every line is checked against its
    /// full requested quantity (not the remaining balance) and shipped in
    /// full. Fails on the first line whose available stock falls short.
    #[instrument(skip(self))]
    pub async fn fulfill_order(
        &self,
        order_id: Uuid,
        fulfilled_by: Uuid,
    ) -> Result<FulfillOrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = load_pending_order(&txn, order_id).await?;
        let lines = load_lines(&txn, order.id).await?;

        for (line, item) in &lines {
            let available = stock_ledger::available_stock(&txn, line.item_id).await?;
            if available < line.requested_quantity {
                return Err(ServiceError::insufficient_stock(
                    &item.item_code,
                    line.requested_quantity,
                    available,
                ));
            }
        }

        let mut fulfilled_items = Vec::new();
        for (line, item) in lines {
            let saved = write_fulfillment(
                &txn,
                &order,
                &item,
                line.requested_quantity,
                Decimal::ZERO,
                line.unit_price,
                format!("Order fulfillment for {}", order.order_number),
                None,
                fulfilled_by,
            )
            .await?;

            let requested = line.requested_quantity;
            let mut active: order_item::ActiveModel = line.into();
            active.fulfilled_quantity = Set(requested);
            active.status = Set(OrderItemStatus::Fulfilled.as_str().to_string());
            active.update(&txn).await?;

            fulfilled_items.push(FulfilledLine {
                item_code: item.item_code,
                quantity: requested,
                transaction_number: saved.transaction_number,
            });
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Fulfilled.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;

        info!(%order_id, lines = fulfilled_items.len(), "Fulfilled order");
        self.emit(Event::OrderFulfilled(order_id)).await;

        Ok(FulfillOrderResponse {
            fulfilled_items,
            order_status: OrderStatus::Fulfilled.as_str().to_string(),
        })
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("Failed to send event: {}", e);
            }
        }
    }
}

async fn load_pending_order(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<OrderModel, ServiceError> {
    let order = OrderEntity::find_by_id(order_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    if order.status() != Some(OrderStatus::Pending) {
        return Err(ServiceError::InvalidState(format!(
            "Order {} is not in pending status",
            order.order_number
        )));
    }
    Ok(order)
}

async fn load_lines(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<Vec<(OrderItemModel, ItemModel)>, ServiceError> {
    let lines = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .find_also_related(ItemEntity)
        .all(txn)
        .await?;

    lines
        .into_iter()
        .map(|(line, item)| {
            item.map(|item| (line, item))
                .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))
        })
        .collect()
}

/// Writes one pre-confirmed OUT transaction for a fulfillment and applies
/// its ledger effect in the same database transaction.
#[allow(clippy::too_many_arguments)]
async fn write_fulfillment(
    txn: &DatabaseTransaction,
    order: &OrderModel,
    item: &ItemModel,
    quantity: Decimal,
    returnable_quantity: Decimal,
    unit_price: Decimal,
    remarks: String,
    expected_return_date: Option<NaiveDate>,
    fulfilled_by: Uuid,
) -> Result<inventory_transaction::Model, ServiceError> {
    let now = Utc::now();
    let model = inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        transaction_number: Set(numbering::transaction_number()),
        item_id: Set(item.id),
        order_id: Set(Some(order.id)),
        transaction_type: Set(TransactionType::Out.as_str().to_string()),
        transaction_sub_type: Set(TransactionSubType::OrderFulfillment.as_str().to_string()),
        quantity: Set(quantity),
        returnable_quantity: Set(returnable_quantity),
        unit_cost: Set(unit_price),
        total_cost: Set(quantity * unit_price),
        reference_number: Set(Some(order.order_number.clone())),
        vendor_customer: Set(Some(order.customer_name.clone())),
        remarks: Set(Some(remarks)),
        transaction_date: Set(now),
        expected_return_date: Set(expected_return_date),
        status: Set(TransactionStatus::Confirmed.as_str().to_string()),
        created_by: Set(fulfilled_by),
        confirmed_at: Set(Some(now)),
        confirmed_by: Set(Some(fulfilled_by)),
        ..Default::default()
    };
    let saved = model.insert(txn).await?;

    stock_ledger::apply_movement(
        txn,
        item.id,
        &item.item_code,
        TransactionType::Out,
        TransactionSubType::OrderFulfillment,
        quantity,
        returnable_quantity,
    )
    .await?;

    Ok(saved)
}

/// Derives and persists the order-level status from its lines, re-read
/// after the caller's line update so the pure-function rule of thumb holds:
/// FULFILLED iff every line is complete, PROCESSING on any progress, else
/// PENDING.
async fn recompute_order_status(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> Result<OrderStatus, ServiceError> {
    let lines = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(txn)
        .await?;

    let all_fulfilled = lines
        .iter()
        .all(|line| line.fulfilled_quantity >= line.requested_quantity);
    let any_progress = lines
        .iter()
        .any(|line| line.fulfilled_quantity > Decimal::ZERO);

    let status = if all_fulfilled {
        OrderStatus::Fulfilled
    } else if any_progress {
        OrderStatus::Processing
    } else {
        OrderStatus::Pending
    };

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Some(Utc::now()));
    active.update(txn).await?;

    Ok(status)
}
