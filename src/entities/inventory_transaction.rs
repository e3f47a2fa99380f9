use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of an inventory movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionType {
    /// Stock received into the warehouse; `quantity` is a delta
    In,
    /// Stock issued out of the warehouse; `quantity` is a delta
    Out,
    /// Physical recount; `quantity` is the absolute new level
    Adjust,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Adjust => "ADJUST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(TransactionType::In),
            "OUT" => Some(TransactionType::Out),
            "ADJUST" => Some(TransactionType::Adjust),
            _ => None,
        }
    }
}

/// Closed classification of a movement within its type. Only
/// `CustomerReturn` changes ledger arithmetic; the rest are reporting
/// categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionSubType {
    // IN
    Purchase,
    CustomerReturn,
    TransferIn,
    Found,
    // OUT
    Sale,
    Consumption,
    TransferOut,
    Damage,
    Loss,
    OrderFulfillment,
    // ADJUST
    StockTake,
    Correction,
    Recount,
    // any type
    Other,
}

impl TransactionSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSubType::Purchase => "PURCHASE",
            TransactionSubType::CustomerReturn => "CUSTOMER_RETURN",
            TransactionSubType::TransferIn => "TRANSFER_IN",
            TransactionSubType::Found => "FOUND",
            TransactionSubType::Sale => "SALE",
            TransactionSubType::Consumption => "CONSUMPTION",
            TransactionSubType::TransferOut => "TRANSFER_OUT",
            TransactionSubType::Damage => "DAMAGE",
            TransactionSubType::Loss => "LOSS",
            TransactionSubType::OrderFulfillment => "ORDER_FULFILLMENT",
            TransactionSubType::StockTake => "STOCK_TAKE",
            TransactionSubType::Correction => "CORRECTION",
            TransactionSubType::Recount => "RECOUNT",
            TransactionSubType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PURCHASE" => Some(TransactionSubType::Purchase),
            "CUSTOMER_RETURN" => Some(TransactionSubType::CustomerReturn),
            "TRANSFER_IN" => Some(TransactionSubType::TransferIn),
            "FOUND" => Some(TransactionSubType::Found),
            "SALE" => Some(TransactionSubType::Sale),
            "CONSUMPTION" => Some(TransactionSubType::Consumption),
            "TRANSFER_OUT" => Some(TransactionSubType::TransferOut),
            "DAMAGE" => Some(TransactionSubType::Damage),
            "LOSS" => Some(TransactionSubType::Loss),
            "ORDER_FULFILLMENT" => Some(TransactionSubType::OrderFulfillment),
            "STOCK_TAKE" => Some(TransactionSubType::StockTake),
            "CORRECTION" => Some(TransactionSubType::Correction),
            "RECOUNT" => Some(TransactionSubType::Recount),
            "OTHER" => Some(TransactionSubType::Other),
            _ => None,
        }
    }

    /// Whether this sub-type is permitted for the given movement type.
    pub fn allowed_for(&self, transaction_type: TransactionType) -> bool {
        match self {
            TransactionSubType::Purchase
            | TransactionSubType::CustomerReturn
            | TransactionSubType::TransferIn
            | TransactionSubType::Found => transaction_type == TransactionType::In,
            TransactionSubType::Sale
            | TransactionSubType::Consumption
            | TransactionSubType::TransferOut
            | TransactionSubType::Damage
            | TransactionSubType::Loss
            | TransactionSubType::OrderFulfillment => transaction_type == TransactionType::Out,
            TransactionSubType::StockTake
            | TransactionSubType::Correction
            | TransactionSubType::Recount => transaction_type == TransactionType::Adjust,
            TransactionSubType::Other => true,
        }
    }
}

/// Lifecycle of a transaction. The ledger effect is applied exactly once,
/// at the moment the status becomes `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransactionStatus::Pending),
            "CONFIRMED" => Some(TransactionStatus::Confirmed),
            "CANCELLED" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_number: String,
    pub item_id: Uuid,
    pub order_id: Option<Uuid>,
    /// Stored as string in the database; converted through `TransactionType`
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

impl Model {
    pub fn transaction_type(&self) -> Option<TransactionType> {
        TransactionType::parse(&self.transaction_type)
    }

    pub fn transaction_sub_type(&self) -> Option<TransactionSubType> {
        TransactionSubType::parse(&self.transaction_sub_type)
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        TransactionStatus::parse(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
