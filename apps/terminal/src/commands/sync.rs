//! # Sync Commands
//!
//! Status and manual triggers for the background sync agent. Sales never
//! wait on these; a failed pass only shows up in the status.

use serde::Serialize;
use tracing::{debug, info};

use kaya_db::Database;
use kaya_sync::{SyncReport, SyncResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::{SyncState, SyncStatusDto};

/// Outcome of a manual sync pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReportDto {
    pub success: bool,
    pub total_synced: u64,
    pub products: Option<SyncResponse>,
    pub orders: Option<SyncResponse>,
    pub customers: Option<SyncResponse>,
    pub errors: Vec<String>,
}

impl From<SyncReport> for SyncReportDto {
    fn from(report: SyncReport) -> Self {
        SyncReportDto {
            success: report.is_success(),
            total_synced: report.total_synced(),
            products: report.products,
            orders: report.orders,
            customers: report.customers,
            errors: report.errors,
        }
    }
}

pub async fn get_sync_status(sync: &SyncState, db: &Database) -> ApiResult<SyncStatusDto> {
    debug!("get_sync_status command");

    let status = sync.status().await;
    let pending = db.orders().count_unsynced().await?;
    Ok(SyncStatusDto::new(status, sync.handle().is_some(), pending))
}

/// Runs a pass now and waits for it.
pub async fn sync_now(sync: &SyncState) -> ApiResult<SyncReportDto> {
    debug!("sync_now command");

    let handle = sync
        .handle()
        .ok_or_else(|| ApiError::sync("Sync is offline"))?;
    let report = handle.sync_now().await?;

    info!(
        synced = report.total_synced(),
        errors = report.errors.len(),
        "Manual sync finished"
    );
    Ok(report.into())
}

/// Tells the agent the network is back. Ignored when offline.
pub fn notify_online(sync: &SyncState) {
    debug!("notify_online command");
    if let Some(handle) = sync.handle() {
        handle.notify_online();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::checkout::{checkout, CheckoutRequest};
    use crate::error::ErrorCode;
    use crate::state::tests::{product_id, test_state};
    use kaya_core::PaymentMethod;
    use kaya_sync::SyncMode;

    #[tokio::test]
    async fn test_offline_status_counts_pending_orders() {
        let state = test_state().await;
        let sobolo = product_id(&state, "2001").await;
        add_to_cart(&state.db, &state.cart, sobolo).await.unwrap();
        checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(PaymentMethod::Cash),
        )
        .await
        .unwrap();

        let status = get_sync_status(&state.sync, &state.db).await.unwrap();
        assert_eq!(status.mode, SyncMode::Offline);
        assert!(!status.agent_running);
        assert_eq!(status.pending_orders, 1);
        assert_eq!(status.passes, 0);
    }

    #[tokio::test]
    async fn test_manual_sync_while_offline() {
        let state = test_state().await;
        let err = sync_now(&state.sync).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SyncError);

        notify_online(&state.sync);
    }

    #[test]
    fn test_report_dto() {
        let report = SyncReport {
            products: Some(SyncResponse {
                synced: 8,
                results: Vec::new(),
            }),
            orders: None,
            customers: Some(SyncResponse::empty()),
            errors: vec!["Orders: connection refused".into()],
        };

        let dto = SyncReportDto::from(report);
        assert!(!dto.success);
        assert_eq!(dto.total_synced, 8);
        assert_eq!(dto.errors.len(), 1);
    }
}
