//! # State Module
//!
//! Session state for the terminal, built once at startup and passed by
//! reference to commands. There is no global.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │   Database   │  │  CartState   │  │ ConfigState  │  │  SyncState  │  │
//! │  │              │  │              │  │              │  │             │  │
//! │  │  SQLite pool │  │  Arc<Mutex<  │  │  store name  │  │  Option<    │  │
//! │  │  + change    │  │    Cart>>    │  │  currency    │  │   Sync      │  │
//! │  │    feed      │  │  + scanner   │  │  tax, quotes │  │   Handle>   │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • Database: internal connection pool                                   │
//! │  • CartState: Arc<Mutex<T>>, never held across an await                 │
//! │  • ConfigState: read-only after startup                                 │
//! │  • SyncState: cloneable handle to the agent task                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the pieces it needs, so `AppState` is a plain
//! bundle with public fields.

mod cart;
mod config;
mod sync;

pub use cart::{CartResponse, CartState, CartTotals};
pub use config::{ConfigState, DEFAULT_QUOTE_VALID_DAYS};
pub use sync::{SyncState, SyncStatusDto};

use kaya_core::cart::AppliedTax;
use kaya_db::{Database, DbResult};

/// Everything a terminal session owns.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cart: CartState,
    pub config: ConfigState,
    pub sync: SyncState,
}

impl AppState {
    /// Builds the session. The cart starts under the default tax rule, or
    /// the configured rate when no rule is marked default.
    pub async fn new(db: Database, config: ConfigState, sync: SyncState) -> DbResult<Self> {
        let tax = initial_tax(&db, &config).await?;
        Ok(AppState {
            db,
            cart: CartState::new(tax),
            config,
            sync,
        })
    }
}

/// Tax applied to a fresh cart.
pub async fn initial_tax(db: &Database, config: &ConfigState) -> DbResult<AppliedTax> {
    Ok(match db.tax_rules().get_default().await? {
        Some(rule) => AppliedTax::from_rule(&rule),
        None => AppliedTax::rate(config.default_tax_rate),
    })
}
