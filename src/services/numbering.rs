use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

// Numbers are time-derived with a process-wide sequence suffix so that
// documents created within the same second still get distinct, ordered
// identifiers.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next(prefix: &str) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) % 10_000;
    format!("{}{}{:04}", prefix, Utc::now().format("%Y%m%d%H%M%S"), seq)
}

/// Generates a unique inventory transaction number (`TXN<timestamp><seq>`).
pub fn transaction_number() -> String {
    next("TXN")
}

/// Generates a unique order number (`ORD<timestamp><seq>`).
pub fn order_number() -> String {
    next("ORD")
}
