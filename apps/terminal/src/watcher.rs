//! # Alert Watcher
//!
//! Recomputes the alert badge whenever products or batches change.
//!
//! ```text
//!  kaya-db write ──► change feed (Table) ──► watcher task
//!                                              │ Products / Batches only
//!                                              ▼
//!                                    derive alerts ──► watch::Sender<AlertSummary>
//! ```
//!
//! A lagging receiver recomputes once and carries on; missed events
//! carry no data of their own.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use kaya_core::alerts::AlertSummary;
use kaya_db::{Database, Table};

use crate::commands::alerts::get_alerts;

/// Background task keeping an [`AlertSummary`] current.
pub struct AlertWatcher {
    task: JoinHandle<()>,
    summary: watch::Receiver<AlertSummary>,
}

impl AlertWatcher {
    /// Computes the first summary and starts watching. Must be called
    /// inside a Tokio runtime.
    pub async fn spawn(db: Database) -> Self {
        let changes = db.subscribe();
        let initial = current_summary(&db).await.unwrap_or_default();
        let (tx, summary) = watch::channel(initial);

        if initial.total > 0 {
            info!(total = initial.total, danger = initial.danger, "Inventory alerts");
        }

        let task = tokio::spawn(run(db, changes, tx));
        AlertWatcher { task, summary }
    }

    /// Receiver for the latest summary.
    pub fn subscribe(&self) -> watch::Receiver<AlertSummary> {
        self.summary.clone()
    }

    pub fn current(&self) -> AlertSummary {
        *self.summary.borrow()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

async fn run(
    db: Database,
    mut changes: broadcast::Receiver<Table>,
    tx: watch::Sender<AlertSummary>,
) {
    loop {
        match changes.recv().await {
            Ok(Table::Products | Table::Batches) => {}
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!(missed, "Alert watcher lagged behind the change feed");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }

        let Some(summary) = current_summary(&db).await else {
            continue;
        };

        let changed = tx.send_if_modified(|current| {
            if *current == summary {
                false
            } else {
                *current = summary;
                true
            }
        });

        if changed {
            info!(total = summary.total, danger = summary.danger, "Inventory alerts changed");
        }
    }
    debug!("Alert watcher stopped");
}

async fn current_summary(db: &Database) -> Option<AlertSummary> {
    match get_alerts(db).await {
        Ok(response) => Some(response.summary),
        Err(e) => {
            warn!(error = %e, "Failed to derive alerts");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{product_id, test_state};
    use kaya_core::ProductUpdate;
    use std::time::Duration;

    #[tokio::test]
    async fn test_summary_follows_stock_changes() {
        let state = test_state().await;
        let watcher = AlertWatcher::spawn(state.db.clone()).await;
        assert_eq!(watcher.current(), AlertSummary::default());

        let mut rx = watcher.subscribe();
        let coke = product_id(&state, "2002").await;
        state
            .db
            .products()
            .update(
                coke,
                &ProductUpdate {
                    stock: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), AlertSummary { total: 1, danger: 1 });

        watcher.stop();
    }
}
