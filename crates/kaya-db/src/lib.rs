//! # kaya-db: Local Ledger for Kaya POS
//!
//! The device's offline source of truth. Every till operation completes
//! against this SQLite file; the network is never consulted.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kaya POS Data Flow                               │
//! │                                                                         │
//! │  Terminal command (checkout, receive_batch, ...)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     kaya-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │◄───│  one per      │    │  (embedded)  │    │    │
//! │  │   │               │    │  table        │    │  0001, 0002  │    │    │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘    │    │
//! │  │           │                                                     │    │
//! │  │           ▼                                                     │    │
//! │  │   ChangeNotifier ──► alert watcher, live views                  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kaya-sync reads unsynced orders, marks acknowledged ones synced        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`change`] - Change feed for live subscriptions
//! - [`seed`] - Starter catalogue for a fresh install
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kaya_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kaya.db")).await?;
//! kaya_db::seed::seed_if_empty(&db).await?;
//!
//! let products = db.products().search("rice", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod change;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use change::{ChangeNotifier, Table};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BatchRepository, CategoryRepository, CustomerRepository, OrderRepository, ProductRepository,
    QuoteRepository, TaxRuleRepository, VariantRepository,
};
