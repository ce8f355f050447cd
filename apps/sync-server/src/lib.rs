//! # Kaya Sync Server
//!
//! Write-only mirror for Kaya POS terminals. Terminals push, the server
//! stores; nothing flows back except per-record acknowledgements.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Server                                      │
//! │                                                                         │
//! │  Terminal ───► HTTP (5000) ───► routes ───► SyncStore ───► SQLite       │
//! │                 TraceLayer                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use db::SyncStore;
pub use error::{ServerError, ServerResult};

/// Builds the application with all routes and middleware.
pub fn build_app(store: SyncStore) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
