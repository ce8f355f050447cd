//! Dashboard figures computed from the ledger on each call.

use chrono::Utc;
use tracing::debug;

use kaya_core::dashboard::DashboardSummary;
use kaya_db::Database;

use crate::error::ApiResult;

pub async fn get_dashboard(db: &Database) -> ApiResult<DashboardSummary> {
    debug!("get_dashboard command");

    let orders = db.orders().list().await?;
    let active_products = db.products().count_active().await?;
    let customers = db.customers().count().await?;

    Ok(DashboardSummary::compute(
        &orders,
        usize::try_from(active_products).unwrap_or_default(),
        usize::try_from(customers).unwrap_or_default(),
        Utc::now(),
    ))
}
