pub mod fulfillment;
pub mod items;
pub mod numbering;
pub mod orders;
pub mod returns;
pub mod stock_ledger;
pub mod transactions;

pub use fulfillment::FulfillmentService;
pub use items::ItemService;
pub use orders::OrderService;
pub use returns::ReturnService;
pub use stock_ledger::StockLedgerService;
pub use transactions::TransactionService;
