use crate::{
    db::DbPool,
    entities::inventory_transaction::{
        self, Entity as TransactionEntity, TransactionStatus,
    },
    entities::item::Entity as ItemEntity,
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity, OrderItemStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{numbering, stock_ledger},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Customer contact is required"))]
    pub customer_contact: String,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddOrderItemRequest {
    pub item_id: Uuid,
    pub requested_quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub requested_quantity: Decimal,
    pub fulfilled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub returnable_quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

/// One line of the fulfillment work queue: what is still owed and whether
/// stock can cover it right now.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingFulfillmentItem {
    pub order_item_id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub requested_quantity: Decimal,
    pub fulfilled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub available_quantity: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingFulfillmentOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub items: Vec<PendingFulfillmentItem>,
}

pub(crate) fn model_to_response(model: OrderModel) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        customer_name: model.customer_name,
        customer_contact: model.customer_contact,
        order_date: model.order_date,
        expected_delivery_date: model.expected_delivery_date,
        status: model.status,
        total_amount: model.total_amount,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Service for customer orders and their line items. Fulfillment progress
/// is driven by the fulfillment engine; this service owns creation, line
/// management and guarded deletion.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        created_by: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(numbering::order_number()),
            customer_name: Set(request.customer_name),
            customer_contact: Set(request.customer_contact),
            order_date: Set(Utc::now()),
            expected_delivery_date: Set(request.expected_delivery_date),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            total_amount: Set(Decimal::ZERO),
            notes: Set(request.notes),
            created_by: Set(created_by),
            updated_at: Set(None),
            ..Default::default()
        };

        let saved = model.insert(&*self.db_pool).await?;

        info!(order_number = %saved.order_number, "Created order");
        self.emit(Event::OrderCreated(saved.id)).await;

        Ok(model_to_response(saved))
    }

    /// Adds a line to a PENDING order and rolls its `total_price` into the
    /// order's running `total_amount`.
    #[instrument(skip(self, request), fields(item_id = %request.item_id))]
    pub async fn add_item(
        &self,
        order_id: Uuid,
        request: AddOrderItemRequest,
    ) -> Result<OrderItemResponse, ServiceError> {
        request.validate()?;
        if request.requested_quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Requested quantity must be positive".to_string(),
            ));
        }
        if request.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Unit price cannot be negative".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order.status() != Some(OrderStatus::Pending) {
            return Err(ServiceError::InvalidState(format!(
                "Cannot modify order {} with status {}",
                order.order_number, order.status
            )));
        }

        let item = ItemEntity::find_by_id(request.item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        let total_price = request.requested_quantity * request.unit_price;

        let line = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item_id: Set(item.id),
            requested_quantity: Set(request.requested_quantity),
            fulfilled_quantity: Set(Decimal::ZERO),
            returnable_quantity: Set(Decimal::ZERO),
            unit_price: Set(request.unit_price),
            total_price: Set(total_price),
            status: Set(OrderItemStatus::Pending.as_str().to_string()),
            ..Default::default()
        };
        let saved = line.insert(&txn).await?;

        let new_total = order.total_amount + total_price;
        let parent_order_id = order.id;
        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(new_total);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;

        self.emit(Event::OrderItemAdded {
            order_id: parent_order_id,
            item_id: item.id,
        })
        .await;

        Ok(OrderItemResponse {
            id: saved.id,
            item_id: item.id,
            item_code: item.item_code,
            item_name: item.item_name,
            remaining_quantity: saved.requested_quantity - saved.fulfilled_quantity,
            requested_quantity: saved.requested_quantity,
            fulfilled_quantity: saved.fulfilled_quantity,
            returnable_quantity: saved.returnable_quantity,
            unit_price: saved.unit_price,
            total_price: saved.total_price,
            status: saved.status,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetailResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let lines = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .find_also_related(ItemEntity)
            .all(&*self.db_pool)
            .await?;

        let items = lines
            .into_iter()
            .map(|(line, item)| {
                let (item_code, item_name) = item
                    .map(|i| (i.item_code, i.item_name))
                    .unwrap_or_default();
                OrderItemResponse {
                    id: line.id,
                    item_id: line.item_id,
                    item_code,
                    item_name,
                    remaining_quantity: line.remaining_quantity(),
                    requested_quantity: line.requested_quantity,
                    fulfilled_quantity: line.fulfilled_quantity,
                    returnable_quantity: line.returnable_quantity,
                    unit_price: line.unit_price,
                    total_price: line.total_price,
                    status: line.status,
                }
            })
            .collect();

        Ok(OrderDetailResponse {
            order: model_to_response(order),
            items,
        })
    }

    /// Lists orders newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<String>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        Ok(orders.into_iter().map(model_to_response).collect())
    }

    /// The fulfillment work queue: PENDING orders with each line's
    /// remaining quantity and the stock currently available to cover it.
    #[instrument(skip(self))]
    pub async fn pending_fulfillment(
        &self,
    ) -> Result<Vec<PendingFulfillmentOrder>, ServiceError> {
        let orders = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .find_also_related(ItemEntity)
                .all(&*self.db_pool)
                .await?;

            let mut items = Vec::with_capacity(lines.len());
            for (line, item) in lines {
                let (item_code, item_name) = item
                    .map(|i| (i.item_code, i.item_name))
                    .unwrap_or_default();
                let available =
                    stock_ledger::available_stock(&*self.db_pool, line.item_id).await?;
                items.push(PendingFulfillmentItem {
                    order_item_id: line.id,
                    item_id: line.item_id,
                    item_code,
                    item_name,
                    remaining_quantity: line.remaining_quantity(),
                    requested_quantity: line.requested_quantity,
                    fulfilled_quantity: line.fulfilled_quantity,
                    available_quantity: available,
                });
            }

            result.push(PendingFulfillmentOrder {
                id: order.id,
                order_number: order.order_number,
                customer_name: order.customer_name,
                customer_contact: order.customer_contact,
                order_date: order.order_date,
                expected_delivery_date: order.expected_delivery_date,
                total_amount: order.total_amount,
                items,
            });
        }

        Ok(result)
    }

    /// Deletes an order that never shipped: only PENDING/CANCELLED orders
    /// with no CONFIRMED transactions, cascading line items and any
    /// PENDING transactions linked to it.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<String, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        match order.status() {
            Some(OrderStatus::Pending) | Some(OrderStatus::Cancelled) => {}
            _ => {
                return Err(ServiceError::InvalidState(format!(
                    "Cannot delete order with status {}",
                    order.status
                )));
            }
        }

        let confirmed = TransactionEntity::find()
            .filter(inventory_transaction::Column::OrderId.eq(order.id))
            .filter(
                inventory_transaction::Column::Status.eq(TransactionStatus::Confirmed.as_str()),
            )
            .count(&txn)
            .await?;
        if confirmed > 0 {
            return Err(ServiceError::HasConfirmedTransactions(
                order.order_number.clone(),
            ));
        }

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await?;
        TransactionEntity::delete_many()
            .filter(inventory_transaction::Column::OrderId.eq(order.id))
            .filter(inventory_transaction::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(&txn)
            .await?;

        let order_number = order.order_number.clone();
        let deleted_id = order.id;
        order.delete(&txn).await?;

        txn.commit().await?;

        info!(%order_number, "Deleted order");
        self.emit(Event::OrderDeleted(deleted_id)).await;

        Ok(order_number)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("Failed to send event: {}", e);
            }
        }
    }
}
