use crate::{
    db::DbPool,
    entities::inventory_transaction::{
        self, Entity as TransactionEntity, Model as TransactionModel, TransactionStatus,
        TransactionSubType, TransactionType,
    },
    entities::item::Entity as ItemEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{numbering, stock_ledger},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionRequest {
    pub item_id: Uuid,
    #[validate(length(min = 1, message = "Transaction type is required"))]
    pub transaction_type: String,
    #[validate(length(min = 1, message = "Transaction sub-type is required"))]
    pub transaction_sub_type: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub returnable_quantity: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    pub reference_number: Option<String>,
    pub vendor_customer: Option<String>,
    pub remarks: Option<String>,
    pub expected_return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_number: String,
    pub item_id: Uuid,
    pub order_id: Option<Uuid>,
    pub transaction_type: String,
    pub transaction_sub_type: String,
    pub quantity: Decimal,
    pub returnable_quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub reference_number: Option<String>,
    pub vendor_customer: Option<String>,
    pub remarks: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub expected_return_date: Option<NaiveDate>,
    pub status: String,
    pub created_by: Uuid,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TransactionFilter {
    pub item_id: Option<Uuid>,
    pub transaction_type: Option<String>,
    pub status: Option<String>,
}

pub(crate) fn model_to_response(model: TransactionModel) -> TransactionResponse {
    TransactionResponse {
        id: model.id,
        transaction_number: model.transaction_number,
        item_id: model.item_id,
        order_id: model.order_id,
        transaction_type: model.transaction_type,
        transaction_sub_type: model.transaction_sub_type,
        quantity: model.quantity,
        returnable_quantity: model.returnable_quantity,
        unit_cost: model.unit_cost,
        total_cost: model.total_cost,
        reference_number: model.reference_number,
        vendor_customer: model.vendor_customer,
        remarks: model.remarks,
        transaction_date: model.transaction_date,
        expected_return_date: model.expected_return_date,
        status: model.status,
        created_by: model.created_by,
        confirmed_at: model.confirmed_at,
        confirmed_by: model.confirmed_by,
        created_at: model.created_at,
    }
}

/// Service for the inventory movement log and its pending → confirmed
/// lifecycle. Creating a transaction never touches the ledger; the effect
/// is applied exactly once, inside `confirm_transaction`.
#[derive(Clone)]
pub struct TransactionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl TransactionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a manual inventory movement as a PENDING transaction.
    #[instrument(skip(self, request), fields(item_id = %request.item_id))]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
        created_by: Uuid,
    ) -> Result<TransactionResponse, ServiceError> {
        request.validate()?;

        let transaction_type = TransactionType::parse(&request.transaction_type).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unknown transaction type: {}",
                request.transaction_type
            ))
        })?;
        let sub_type = TransactionSubType::parse(&request.transaction_sub_type).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unknown transaction sub-type: {}",
                request.transaction_sub_type
            ))
        })?;
        if !sub_type.allowed_for(transaction_type) {
            return Err(ServiceError::ValidationError(format!(
                "Sub-type {} is not valid for {} transactions",
                sub_type.as_str(),
                transaction_type.as_str()
            )));
        }

        match transaction_type {
            TransactionType::In | TransactionType::Out => {
                if request.quantity <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Quantity must be positive for IN/OUT movements".to_string(),
                    ));
                }
            }
            TransactionType::Adjust => {
                if request.quantity < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Adjustment quantity cannot be negative".to_string(),
                    ));
                }
            }
        }

        let item = ItemEntity::find_by_id(request.item_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        if request.returnable_quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Returnable quantity cannot be negative".to_string(),
            ));
        }
        if request.returnable_quantity > Decimal::ZERO {
            if transaction_type != TransactionType::Out {
                return Err(ServiceError::ValidationError(
                    "Returnable quantity is only valid on OUT movements".to_string(),
                ));
            }
            if !item.is_returnable {
                return Err(ServiceError::ValidationError(format!(
                    "Item {} is not returnable",
                    item.item_code
                )));
            }
            if request.returnable_quantity > request.quantity {
                return Err(ServiceError::ValidationError(
                    "Returnable quantity cannot exceed movement quantity".to_string(),
                ));
            }
        }

        let total_cost = request.quantity * request.unit_cost;
        let now = Utc::now();

        let model = inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_number: Set(numbering::transaction_number()),
            item_id: Set(item.id),
            order_id: Set(None),
            transaction_type: Set(transaction_type.as_str().to_string()),
            transaction_sub_type: Set(sub_type.as_str().to_string()),
            quantity: Set(request.quantity),
            returnable_quantity: Set(request.returnable_quantity),
            unit_cost: Set(request.unit_cost),
            total_cost: Set(total_cost),
            reference_number: Set(request.reference_number),
            vendor_customer: Set(request.vendor_customer),
            remarks: Set(request.remarks),
            transaction_date: Set(now),
            expected_return_date: Set(request.expected_return_date),
            status: Set(TransactionStatus::Pending.as_str().to_string()),
            created_by: Set(created_by),
            confirmed_at: Set(None),
            confirmed_by: Set(None),
            ..Default::default()
        };

        let saved = model.insert(&*self.db_pool).await?;

        info!(
            transaction_number = %saved.transaction_number,
            transaction_type = %saved.transaction_type,
            quantity = %saved.quantity,
            "Created pending transaction"
        );
        self.emit(Event::TransactionCreated(saved.id)).await;

        Ok(model_to_response(saved))
    }

    /// Confirms a PENDING transaction, applying its ledger effect. The
    /// ledger update and the status flip commit as one unit; on failure
    /// the transaction stays PENDING with no partial effect.
    #[instrument(skip(self))]
    pub async fn confirm_transaction(
        &self,
        transaction_id: Uuid,
        confirmed_by: Uuid,
    ) -> Result<TransactionResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let transaction = TransactionEntity::find_by_id(transaction_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Transaction not found".to_string()))?;

        if transaction.status() != Some(TransactionStatus::Pending) {
            return Err(ServiceError::AlreadyProcessed(
                transaction.transaction_number,
            ));
        }

        let transaction_type = transaction.transaction_type().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Transaction {} has unknown type {}",
                transaction.transaction_number, transaction.transaction_type
            ))
        })?;
        let sub_type = transaction.transaction_sub_type().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Transaction {} has unknown sub-type {}",
                transaction.transaction_number, transaction.transaction_sub_type
            ))
        })?;

        let item = ItemEntity::find_by_id(transaction.item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        let level = stock_ledger::apply_movement(
            &txn,
            item.id,
            &item.item_code,
            transaction_type,
            sub_type,
            transaction.quantity,
            transaction.returnable_quantity,
        )
        .await?;

        let quantity = transaction.quantity;
        let mut active: inventory_transaction::ActiveModel = transaction.into();
        active.status = Set(TransactionStatus::Confirmed.as_str().to_string());
        active.confirmed_at = Set(Some(Utc::now()));
        active.confirmed_by = Set(Some(confirmed_by));
        let confirmed = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            transaction_number = %confirmed.transaction_number,
            current_quantity = %level.current_quantity,
            "Confirmed transaction"
        );
        self.emit(Event::TransactionConfirmed {
            transaction_id: confirmed.id,
            item_id: confirmed.item_id,
            quantity,
        })
        .await;
        self.emit(Event::StockLevelChanged {
            item_id: confirmed.item_id,
            current_quantity: level.current_quantity,
            available_quantity: level.available_quantity,
        })
        .await;

        Ok(model_to_response(confirmed))
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<TransactionResponse, ServiceError> {
        let transaction = TransactionEntity::find_by_id(transaction_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Transaction not found".to_string()))?;
        Ok(model_to_response(transaction))
    }

    /// Lists transactions newest first, optionally filtered by item, type
    /// and status.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionResponse>, ServiceError> {
        let mut query = TransactionEntity::find();
        if let Some(item_id) = filter.item_id {
            query = query.filter(inventory_transaction::Column::ItemId.eq(item_id));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query
                .filter(inventory_transaction::Column::TransactionType.eq(transaction_type));
        }
        if let Some(status) = filter.status {
            query = query.filter(inventory_transaction::Column::Status.eq(status));
        }

        let transactions = query
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        Ok(transactions.into_iter().map(model_to_response).collect())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("Failed to send event: {}", e);
            }
        }
    }
}

/// Sum of CONFIRMED return settlements chained to an original OUT
/// transaction by `reference_number`.
pub(crate) async fn returned_so_far<C: sea_orm::ConnectionTrait>(
    conn: &C,
    original_number: &str,
) -> Result<Decimal, ServiceError> {
    let settlements = TransactionEntity::find()
        .filter(inventory_transaction::Column::ReferenceNumber.eq(original_number))
        .filter(
            inventory_transaction::Column::TransactionSubType
                .eq(TransactionSubType::CustomerReturn.as_str()),
        )
        .filter(inventory_transaction::Column::Status.eq(TransactionStatus::Confirmed.as_str()))
        .all(conn)
        .await?;

    Ok(settlements.iter().map(|t| t.quantity).sum())
}
