//! # Change Feed
//!
//! Every repository write announces the tables it touched, cascades
//! included, so live views (alerts, product lists) can recompute.
//!
//! ```text
//!  batches().insert(..)  ──► notify([Batches, Products])
//!                                  │
//!                     broadcast::Sender<Table>
//!                       │          │          │
//!                  alert watcher  view     view ...
//! ```
//!
//! A slow subscriber that falls behind sees `RecvError::Lagged` and should
//! simply recompute; the feed carries no payload worth replaying.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered notifications per subscriber before it lags.
const CHANNEL_CAPACITY: usize = 64;

/// A ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Products,
    Categories,
    Variants,
    Batches,
    TaxRules,
    Orders,
    Quotes,
    Customers,
}

#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<Table>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        ChangeNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Table> {
        self.tx.subscribe()
    }

    /// Announces a committed write.
    pub fn notify(&self, tables: &[Table]) {
        for table in tables {
            // No subscribers is fine
            if self.tx.send(*table).is_err() {
                trace!(?table, "Change with no subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_every_table() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(&[Table::Batches, Table::Products]);

        assert_eq!(rx.recv().await.unwrap(), Table::Batches);
        assert_eq!(rx.recv().await.unwrap(), Table::Products);
    }

    #[test]
    fn test_notify_without_subscribers() {
        ChangeNotifier::new().notify(&[Table::Orders]);
    }
}
