//! # Alert Commands
//!
//! Alerts are never stored. Each call derives them from the current
//! products and batches:
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐
//! │  products    │    │   batches    │
//! └──────┬───────┘    └──────┬───────┘
//!        │ stock ≤ threshold │ expiry within window
//!        └─────────┬─────────┘
//!                  ▼
//!          derive_alerts(now) ──► AlertsResponse { alerts, summary }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use kaya_core::alerts::{derive_alerts, Alert, AlertSummary};
use kaya_db::Database;

use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
}

pub async fn get_alerts(db: &Database) -> ApiResult<AlertsResponse> {
    debug!("get_alerts command");
    alerts_at(db, Utc::now()).await
}

/// Alerts as of `now`.
pub(crate) async fn alerts_at(db: &Database, now: DateTime<Utc>) -> ApiResult<AlertsResponse> {
    let products = db.products().list().await?;
    let batches = db.batches().list().await?;

    let alerts = derive_alerts(&products, &batches, now);
    let summary = AlertSummary::of(&alerts);
    Ok(AlertsResponse { alerts, summary })
}
