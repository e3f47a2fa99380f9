use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderItemStatus {
    Pending,
    Partial,
    Fulfilled,
}

impl OrderItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderItemStatus::Pending => "PENDING",
            OrderItemStatus::Partial => "PARTIAL",
            OrderItemStatus::Fulfilled => "FULFILLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderItemStatus::Pending),
            "PARTIAL" => Some(OrderItemStatus::Partial),
            "FULFILLED" => Some(OrderItemStatus::Fulfilled),
            _ => None,
        }
    }

    /// Line status is a pure function of the fulfilled/requested pair.
    pub fn derive(fulfilled: Decimal, requested: Decimal) -> Self {
        if fulfilled >= requested {
            OrderItemStatus::Fulfilled
        } else if fulfilled > Decimal::ZERO {
            OrderItemStatus::Partial
        } else {
            OrderItemStatus::Pending
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub requested_quantity: Decimal,
    /// Monotonically non-decreasing, never exceeds `requested_quantity`
    pub fulfilled_quantity: Decimal,
    /// Extra/returnable units granted during fulfillment
    pub returnable_quantity: Decimal,
    pub unit_price: Decimal,
    /// `requested_quantity × unit_price`, fixed at add-time
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn status(&self) -> Option<OrderItemStatus> {
        OrderItemStatus::parse(&self.status)
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.requested_quantity - self.fulfilled_quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
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
