use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted by the services after a state change commits. Consumed by
/// the background processor; handlers are fire-and-forget and never affect
/// the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Transaction events
    TransactionCreated(Uuid),
    TransactionConfirmed {
        transaction_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    },

    // Order events
    OrderCreated(Uuid),
    OrderDeleted(Uuid),
    OrderItemAdded {
        order_id: Uuid,
        item_id: Uuid,
    },
    OrderFulfilled(Uuid),

    // Ledger events
    StockLevelChanged {
        item_id: Uuid,
        current_quantity: Decimal,
        available_quantity: Decimal,
    },
    ReturnProcessed {
        transaction_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the server; exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransactionConfirmed {
                transaction_id,
                item_id,
                quantity,
            } => {
                info!(
                    %transaction_id,
                    %item_id,
                    %quantity,
                    "Transaction confirmed"
                );
            }
            Event::StockLevelChanged {
                item_id,
                current_quantity,
                available_quantity,
            } => {
                info!(
                    %item_id,
                    %current_quantity,
                    %available_quantity,
                    "Stock level changed"
                );
            }
            Event::ReturnProcessed {
                transaction_id,
                item_id,
                quantity,
            } => {
                info!(%transaction_id, %item_id, %quantity, "Return processed");
            }
            Event::OrderFulfilled(order_id) => {
                info!(%order_id, "Order fulfilled");
            }
            _ => {
                info!("Event: {:?}", event);
            }
        }
    }
}
