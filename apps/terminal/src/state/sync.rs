//! # Sync State
//!
//! Holds the handle to the background sync agent, if one was started.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SyncState                                         │
//! │                                                                         │
//! │   mode: auto     ──► Some(SyncHandle) ──► agent task (timer, online)    │
//! │   mode: offline  ──► None               ──► commands answer "offline"   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use kaya_sync::{SyncHandle, SyncMode, SyncStatus};

/// Sync agent state for the session.
#[derive(Clone)]
pub struct SyncState {
    mode: SyncMode,
    handle: Option<SyncHandle>,
}

impl SyncState {
    /// State for a terminal that never syncs.
    pub fn offline() -> Self {
        SyncState {
            mode: SyncMode::Offline,
            handle: None,
        }
    }

    /// State wrapping a running agent.
    pub fn running(mode: SyncMode, handle: SyncHandle) -> Self {
        SyncState {
            mode,
            handle: Some(handle),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn handle(&self) -> Option<&SyncHandle> {
        self.handle.as_ref()
    }

    /// Current agent status, or an idle status when offline.
    pub async fn status(&self) -> SyncStatus {
        match &self.handle {
            Some(handle) => handle.status().await,
            None => SyncStatus {
                mode: self.mode,
                ..Default::default()
            },
        }
    }

    /// Stops the agent, if any.
    pub async fn shutdown(&self) {
        if let Some(handle) = &self.handle {
            handle.shutdown().await;
        }
    }
}

/// Sync status as returned to the till.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusDto {
    pub mode: SyncMode,
    pub agent_running: bool,
    pub pass_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_errors: Vec<String>,
    pub last_synced: u64,
    pub passes: u64,
    pub skipped_passes: u64,
    /// Non-draft orders still waiting for the server
    pub pending_orders: i64,
}

impl SyncStatusDto {
    pub fn new(status: SyncStatus, agent_running: bool, pending_orders: i64) -> Self {
        SyncStatusDto {
            mode: status.mode,
            agent_running,
            pass_running: status.running,
            last_run: status.last_run,
            last_success: status.last_success,
            last_errors: status.last_errors,
            last_synced: status.last_synced,
            passes: status.passes,
            skipped_passes: status.skipped_passes,
            pending_orders,
        }
    }
}
