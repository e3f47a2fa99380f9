use crate::{
    db::DbPool,
    entities::inventory_transaction::{
        self, Entity as TransactionEntity, TransactionStatus, TransactionSubType, TransactionType,
    },
    entities::item::Entity as ItemEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::numbering,
    services::transactions::{self, TransactionResponse},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProcessReturnRequest {
    /// The original returnable OUT transaction being settled.
    pub transaction_id: Uuid,
    pub returned_quantity: Decimal,
    /// Physical condition of the returned goods. Recorded in remarks only;
    /// a DAMAGED return credits stock exactly like a GOOD one.
    #[validate(length(min = 1, message = "Condition is required"))]
    pub condition: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnableItemResponse {
    pub transaction_id: Uuid,
    pub transaction_number: String,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub customer_name: Option<String>,
    pub total_returnable: Decimal,
    pub returned_quantity: Decimal,
    pub outstanding_quantity: Decimal,
    pub expected_return_date: Option<NaiveDate>,
    pub transaction_date: DateTime<Utc>,
    pub is_overdue: bool,
}

/// Reverses part of a returnable OUT movement. A return is recorded as a
/// PENDING IN settlement chained to the original by `reference_number`;
/// stock is credited back only when that settlement is confirmed.
#[derive(Clone)]
pub struct ReturnService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ReturnService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    pub async fn process_return(
        &self,
        request: ProcessReturnRequest,
        created_by: Uuid,
    ) -> Result<TransactionResponse, ServiceError> {
        request.validate()?;
        if request.returned_quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Returned quantity must be positive".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let original = TransactionEntity::find_by_id(request.transaction_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Original transaction not found".to_string())
            })?;

        if original.transaction_type() != Some(TransactionType::Out) {
            return Err(ServiceError::ValidationError(
                "Original transaction is not an OUT movement".to_string(),
            ));
        }

        let returned_so_far =
            transactions::returned_so_far(&txn, &original.transaction_number).await?;
        let outstanding = original.returnable_quantity - returned_so_far;
        if request.returned_quantity > outstanding {
            return Err(ServiceError::ExceedsOutstanding {
                requested: request.returned_quantity,
                outstanding,
            });
        }

        let remarks = match request.remarks {
            Some(extra) if !extra.is_empty() => {
                format!("Return - Condition: {}. {}", request.condition, extra)
            }
            _ => format!("Return - Condition: {}.", request.condition),
        };

        let model = inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_number: Set(numbering::transaction_number()),
            item_id: Set(original.item_id),
            order_id: Set(original.order_id),
            transaction_type: Set(TransactionType::In.as_str().to_string()),
            transaction_sub_type: Set(TransactionSubType::CustomerReturn.as_str().to_string()),
            quantity: Set(request.returned_quantity),
            returnable_quantity: Set(Decimal::ZERO),
            unit_cost: Set(original.unit_cost),
            total_cost: Set(request.returned_quantity * original.unit_cost),
            reference_number: Set(Some(original.transaction_number.clone())),
            vendor_customer: Set(original.vendor_customer.clone()),
            remarks: Set(Some(remarks)),
            transaction_date: Set(Utc::now()),
            expected_return_date: Set(None),
            status: Set(TransactionStatus::Pending.as_str().to_string()),
            created_by: Set(created_by),
            confirmed_at: Set(None),
            confirmed_by: Set(None),
            ..Default::default()
        };
        let saved = model.insert(&txn).await?;

        txn.commit().await?;

        info!(
            transaction_number = %saved.transaction_number,
            original = %original.transaction_number,
            returned_quantity = %request.returned_quantity,
            "Recorded pending return settlement"
        );
        self.emit(Event::ReturnProcessed {
            transaction_id: saved.id,
            item_id: saved.item_id,
            quantity: saved.quantity,
        })
        .await;

        Ok(transactions::model_to_response(saved))
    }

    /// Confirmed OUT movements that still have returnable units with the
    /// customer, with the settlement history folded in.
    #[instrument(skip(self))]
    pub async fn returnable_items(&self) -> Result<Vec<ReturnableItemResponse>, ServiceError> {
        let outgoing = TransactionEntity::find()
            .filter(inventory_transaction::Column::ReturnableQuantity.gt(Decimal::ZERO))
            .filter(
                inventory_transaction::Column::Status.eq(TransactionStatus::Confirmed.as_str()),
            )
            .filter(
                inventory_transaction::Column::TransactionType.eq(TransactionType::Out.as_str()),
            )
            .find_also_related(ItemEntity)
            .all(&*self.db_pool)
            .await?;

        let today = Utc::now().date_naive();
        let mut result = Vec::new();
        for (txn, item) in outgoing {
            let returned =
                transactions::returned_so_far(&*self.db_pool, &txn.transaction_number).await?;
            let outstanding = txn.returnable_quantity - returned;
            if outstanding <= Decimal::ZERO {
                continue;
            }

            let (item_code, item_name) = item
                .map(|i| (i.item_code, i.item_name))
                .unwrap_or_default();
            result.push(ReturnableItemResponse {
                transaction_id: txn.id,
                transaction_number: txn.transaction_number,
                item_id: txn.item_id,
                item_code,
                item_name,
                customer_name: txn.vendor_customer,
                total_returnable: txn.returnable_quantity,
                returned_quantity: returned,
                outstanding_quantity: outstanding,
                is_overdue: txn
                    .expected_return_date
                    .map(|d| d < today)
                    .unwrap_or(false),
                expected_return_date: txn.expected_return_date,
                transaction_date: txn.transaction_date,
            });
        }

        Ok(result)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("Failed to send event: {}", e);
            }
        }
    }
}
