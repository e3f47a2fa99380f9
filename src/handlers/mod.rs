pub mod inventory;
pub mod items;
pub mod orders;
pub mod returns;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<crate::services::ItemService>,
    pub stock_ledger: Arc<crate::services::StockLedgerService>,
    pub transactions: Arc<crate::services::TransactionService>,
    pub orders: Arc<crate::services::OrderService>,
    pub fulfillment: Arc<crate::services::FulfillmentService>,
    pub returns: Arc<crate::services::ReturnService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            items: Arc::new(crate::services::ItemService::new(db_pool.clone())),
            stock_ledger: Arc::new(crate::services::StockLedgerService::new(db_pool.clone())),
            transactions: Arc::new(crate::services::TransactionService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            orders: Arc::new(crate::services::OrderService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            fulfillment: Arc::new(crate::services::FulfillmentService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            returns: Arc::new(crate::services::ReturnService::new(
                db_pool,
                Some(event_sender),
            )),
        }
    }
}
