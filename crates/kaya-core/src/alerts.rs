//! # Alerts
//!
//! Low-stock and batch-expiry alerts, derived from the catalogue on demand.
//!
//! Nothing here is persisted or acknowledged. Callers re-run
//! [`derive_alerts`] whenever products or batches change and replace their
//! previous list wholesale.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LOW STOCK   product.is_active && stock <= low_stock_threshold          │
//! │              stock == 0 → danger, else warning                          │
//! │                                                                         │
//! │  EXPIRY      batch.remaining_quantity > 0 && expiry_date is set         │
//! │              days_left = ceil((expiry − now) / 1 day)                   │
//! │                                                                         │
//! │              days_left ≤ 0        → expired,  danger                    │
//! │              1 ≤ days_left ≤ 7    → expiring, danger                    │
//! │              8 ≤ days_left ≤ 30   → expiring, warning                   │
//! │              days_left > 30       → (none)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Batch, LocalId, Product};
use crate::{EXPIRY_ALERT_WINDOW_DAYS, EXPIRY_DANGER_DAYS};

const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    Expiring,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Danger,
}

/// A derived alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable id: `low-{product_id}` or `exp-{batch_id}`.
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub product_id: LocalId,
}

/// Counts for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub danger: usize,
}

impl AlertSummary {
    pub fn of(alerts: &[Alert]) -> Self {
        AlertSummary {
            total: alerts.len(),
            danger: alerts
                .iter()
                .filter(|a| a.severity == Severity::Danger)
                .count(),
        }
    }
}

/// Whole days until `expiry`, rounded up. Zero or negative once expired.
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (expiry - now).num_milliseconds();
    let days = ms.div_euclid(MS_PER_DAY);
    if ms.rem_euclid(MS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

fn low_stock_alert(product: &Product) -> Option<Alert> {
    if !product.is_low_stock() {
        return None;
    }

    let severity = if product.stock == 0 {
        Severity::Danger
    } else {
        Severity::Warning
    };

    Some(Alert {
        id: format!("low-{}", product.id),
        kind: AlertKind::LowStock,
        severity,
        title: format!("Low Stock: {}", product.name),
        message: format!(
            "Only {} units remaining (threshold: {})",
            product.stock, product.low_stock_threshold
        ),
        product_id: product.id,
    })
}

fn expiry_alert(batch: &Batch, product_name: &str, now: DateTime<Utc>) -> Option<Alert> {
    let expiry = batch.expiry_date?;
    if batch.remaining_quantity <= 0 {
        return None;
    }

    let days_left = days_until(expiry, now);
    if days_left > EXPIRY_ALERT_WINDOW_DAYS {
        return None;
    }

    let expired = days_left <= 0;
    let severity = if expired || days_left <= EXPIRY_DANGER_DAYS {
        Severity::Danger
    } else {
        Severity::Warning
    };

    let (kind, title, message) = if expired {
        (
            AlertKind::Expired,
            format!("Expired: {product_name}"),
            format!(
                "Batch {} has expired ({} units)",
                batch.batch_number, batch.remaining_quantity
            ),
        )
    } else {
        (
            AlertKind::Expiring,
            format!("Expiring Soon: {product_name}"),
            format!(
                "Batch {} expires in {} day(s) ({} units)",
                batch.batch_number, days_left, batch.remaining_quantity
            ),
        )
    };

    Some(Alert {
        id: format!("exp-{}", batch.id),
        kind,
        severity,
        title,
        message,
        product_id: batch.product_id,
    })
}

/// Derives every current alert. Low-stock alerts come first, then expiry
/// alerts, each in input order.
pub fn derive_alerts(products: &[Product], batches: &[Batch], now: DateTime<Utc>) -> Vec<Alert> {
    let names: HashMap<LocalId, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    let low_stock = products.iter().filter_map(low_stock_alert);
    let expiry = batches.iter().filter_map(|b| {
        let name = names.get(&b.product_id).copied().unwrap_or("Unknown");
        expiry_alert(b, name, now)
    });

    low_stock.chain(expiry).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
