use crate::{
    db::DbPool,
    entities::item::{self, Entity as ItemEntity, Model as ItemModel},
    entities::stock_level::{self, Entity as StockLevelEntity},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub min_stock_level: Decimal,
    pub max_stock_level: Decimal,
    pub standard_cost: Decimal,
    pub is_returnable: bool,
    pub is_active: bool,
    pub current_quantity: Decimal,
    pub available_quantity: Decimal,
    pub returnable_quantity: Decimal,
}

fn to_response(item: ItemModel, level: Option<stock_level::Model>) -> ItemResponse {
    let (current, available, returnable) = level
        .map(|l| (l.current_quantity, l.available_quantity, l.returnable_quantity))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
    ItemResponse {
        id: item.id,
        item_code: item.item_code,
        item_name: item.item_name,
        description: item.description,
        unit_of_measure: item.unit_of_measure,
        min_stock_level: item.min_stock_level,
        max_stock_level: item.max_stock_level,
        standard_cost: item.standard_cost,
        is_returnable: item.is_returnable,
        is_active: item.is_active,
        current_quantity: current,
        available_quantity: available,
        returnable_quantity: returnable,
    }
}

/// Read-only access to item master data joined with its ledger row. Items
/// are maintained outside this service; nothing here writes them.
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<ItemResponse>, ServiceError> {
        let items = ItemEntity::find()
            .filter(item::Column::IsActive.eq(true))
            .order_by_asc(item::Column::ItemCode)
            .find_also_related(StockLevelEntity)
            .all(&*self.db_pool)
            .await?;

        Ok(items
            .into_iter()
            .map(|(item, level)| to_response(item, level))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<ItemResponse, ServiceError> {
        let item = ItemEntity::find_by_id(item_id)
            .find_also_related(StockLevelEntity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        let (item, level) = item;
        Ok(to_response(item, level))
    }
}
