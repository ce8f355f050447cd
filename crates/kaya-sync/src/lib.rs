//! # kaya-sync: Sync Reconciler for Kaya POS
//!
//! Pushes the local ledger to the remote sync server. The device never
//! pulls: the server is a write-only mirror.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                   SyncAgent (background task)                    │   │
//! │  │   startup delay ─► every interval ─► on reconnect ─► on demand   │   │
//! │  └────────────────────────────┬─────────────────────────────────────┘   │
//! │                               │ one pass at a time                      │
//! │  ┌────────────────────────────▼─────────────────────────────────────┐   │
//! │  │                      SyncReconciler                              │   │
//! │  │   products (all) │ orders (unsynced, no drafts) │ customers (all)│   │
//! │  └────────────────────────────┬─────────────────────────────────────┘   │
//! │                               │ SyncTransport                           │
//! │  ┌────────────────────────────▼─────────────────────────────────────┐   │
//! │  │                        SyncClient (reqwest)                      │   │
//! │  │            POST /api/sync/{products,orders,customers}            │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - `SyncAgent`, `SyncHandle`, status and event emitters
//! - [`client`] - HTTP client for the sync endpoints
//! - [`config`] - Sync configuration (mode, device ID, server URL, timing)
//! - [`error`] - Sync error types
//! - [`protocol`] - camelCase wire payloads and responses
//! - [`reconciler`] - One sync pass over the three categories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kaya_sync::{SyncAgent, SyncConfig, TracingEmitter};
//!
//! let config = SyncConfig::load_or_default(None);
//! if let Some(handle) = SyncAgent::start(&config, db.clone(), Arc::new(TracingEmitter))? {
//!     let report = handle.sync_now().await?;
//!     println!("pushed {} records", report.total_synced());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod reconciler;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{
    NoOpEmitter, SyncAgent, SyncEventEmitter, SyncHandle, SyncSchedule, SyncStatus, SyncTrigger,
    TracingEmitter,
};
pub use client::SyncClient;
pub use config::{SyncConfig, SyncMode};
pub use error::{SyncError, SyncResult};
pub use protocol::{
    CustomerPayload, ItemResult, OrderItemPayload, OrderPayload, ProductPayload, StatusResponse,
    SyncAction, SyncKind, SyncResponse,
};
pub use reconciler::{SyncReconciler, SyncReport, SyncTransport};
