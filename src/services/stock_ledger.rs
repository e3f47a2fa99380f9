use crate::{
    db::DbPool,
    entities::inventory_transaction::{TransactionSubType, TransactionType},
    entities::stock_level::{self, Entity as StockLevelEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StockLevelResponse {
    pub item_id: Uuid,
    pub current_quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub returnable_quantity: Decimal,
    pub available_quantity: Decimal,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Read-side access to the stock ledger. Mutation goes through
/// [`apply_movement`], which only the transaction-confirm and fulfillment
/// paths call.
#[derive(Clone)]
pub struct StockLedgerService {
    db_pool: Arc<DbPool>,
}

impl StockLedgerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Returns the ledger row for an item, or an all-zero view when no row
    /// exists yet (rows are created lazily by the first movement).
    #[instrument(skip(self))]
    pub async fn get_stock(&self, item_id: Uuid) -> Result<StockLevelResponse, ServiceError> {
        let level = StockLevelEntity::find()
            .filter(stock_level::Column::ItemId.eq(item_id))
            .one(&*self.db_pool)
            .await?;

        Ok(match level {
            Some(level) => StockLevelResponse {
                item_id,
                current_quantity: level.current_quantity,
                reserved_quantity: level.reserved_quantity,
                returnable_quantity: level.returnable_quantity,
                available_quantity: level.available_quantity,
                last_updated: Some(level.last_updated),
            },
            None => StockLevelResponse {
                item_id,
                current_quantity: Decimal::ZERO,
                reserved_quantity: Decimal::ZERO,
                returnable_quantity: Decimal::ZERO,
                available_quantity: Decimal::ZERO,
                last_updated: None,
            },
        })
    }
}

/// Returns an item's available quantity (`current − reserved`), zero when no
/// ledger row exists.
pub async fn available_stock<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let level = StockLevelEntity::find()
        .filter(stock_level::Column::ItemId.eq(item_id))
        .one(conn)
        .await?;
    Ok(level
        .map(|l| l.current_quantity - l.reserved_quantity)
        .unwrap_or(Decimal::ZERO))
}

/// Applies one inventory movement to an item's ledger row within the
/// caller's database transaction. Creates the row lazily with all
/// quantities zero when the item has never moved before.
///
/// - IN adds `quantity` to current; a CUSTOMER_RETURN settlement also
///   releases that much of the outstanding returnable obligation.
/// - OUT subtracts `quantity` from current, failing with
///   `InsufficientStock` when current cannot cover it; a positive
///   `returnable_delta` records a new return obligation.
/// - ADJUST sets current to `quantity` outright (physical recount).
///
/// `available_quantity` is recomputed as `current − reserved` on every
/// call. `reserved_quantity` is never written here; nothing in this core
/// reserves stock.
pub async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    item_code: &str,
    transaction_type: TransactionType,
    sub_type: TransactionSubType,
    quantity: Decimal,
    returnable_delta: Decimal,
) -> Result<stock_level::Model, ServiceError> {
    let level = StockLevelEntity::find()
        .filter(stock_level::Column::ItemId.eq(item_id))
        .one(conn)
        .await?;

    let level = match level {
        Some(level) => level,
        None => {
            let row = stock_level::ActiveModel {
                id: Set(Uuid::new_v4()),
                item_id: Set(item_id),
                current_quantity: Set(Decimal::ZERO),
                reserved_quantity: Set(Decimal::ZERO),
                returnable_quantity: Set(Decimal::ZERO),
                available_quantity: Set(Decimal::ZERO),
                last_updated: Set(Utc::now()),
            };
            row.insert(conn).await?
        }
    };

    let mut current = level.current_quantity;
    let mut returnable = level.returnable_quantity;

    match transaction_type {
        TransactionType::In => {
            current += quantity;
            if sub_type == TransactionSubType::CustomerReturn {
                returnable -= quantity;
            }
        }
        TransactionType::Out => {
            if current < quantity {
                return Err(ServiceError::insufficient_stock(
                    item_code, quantity, current,
                ));
            }
            current -= quantity;
            if returnable_delta > Decimal::ZERO {
                returnable += returnable_delta;
            }
        }
        TransactionType::Adjust => {
            current = quantity;
        }
    }

    let available = current - level.reserved_quantity;

    let mut active: stock_level::ActiveModel = level.into();
    active.current_quantity = Set(current);
    active.returnable_quantity = Set(returnable);
    active.available_quantity = Set(available);
    active.last_updated = Set(Utc::now());
    let updated = active.update(conn).await?;

    info!(
        %item_id,
        movement = transaction_type.as_str(),
        %quantity,
        current_quantity = %updated.current_quantity,
        available_quantity = %updated.available_quantity,
        "Applied stock movement"
    );

    Ok(updated)
}
