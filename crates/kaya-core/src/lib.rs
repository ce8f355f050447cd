//! # kaya-core: Pure Business Logic for Kaya POS
//!
//! Everything that decides a price, a cart transition or an alert lives here,
//! as plain functions over plain data. The crate performs no I/O and never
//! reads a clock: callers pass `now` in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kaya POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/terminal (session + commands)              │   │
//! │  │   scan ──► cart ──► checkout / draft / quote ──► ledger write   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kaya-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐  │   │
//! │  │  │ pricing │ │  cart   │ │ alerts  │ │ scanner │ │dashboard │  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘  │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────┐            │   │
//! │  │  │  money  │ │  types  │ │  order  │ │ validation │            │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kaya-db (local ledger, SQLite)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money`, a signed exact decimal amount
//! - [`types`] - Catalogue entities (Product, Category, Batch, TaxRule, ...)
//! - [`order`] - Orders, quotes, payment splits and their statuses
//! - [`pricing`] - The pricing engine (subtotal, tax, discount, total)
//! - [`cart`] - The in-memory cart state machine
//! - [`alerts`] - Low-stock and batch-expiry alert projection
//! - [`scanner`] - Keystroke buffer that tells scanner bursts from typing
//! - [`dashboard`] - Revenue summary over the order ledger
//! - [`validation`] - Input validation at the command boundary
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kaya_core::money::Money;
//! use kaya_core::pricing::{price_lines, OrderDiscount, PricedLine};
//! use kaya_core::types::TaxRate;
//!
//! let lines = [PricedLine::new(Money::from_major(45), 2, Money::ZERO)];
//! let tax = TaxRate::from_percent(15).unwrap();
//!
//! let breakdown = price_lines(&lines, tax, &OrderDiscount::none());
//! assert_eq!(breakdown.total.to_string(), "103.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod cart;
pub mod dashboard;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod scanner;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AppliedTax, Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::*;
pub use pricing::{DiscountType, OrderDiscount, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default low-stock threshold for new products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Default tax rate as a percentage (15% VAT).
pub const DEFAULT_TAX_PERCENT: u32 = 15;

/// Batches expiring within this many days raise an alert.
pub const EXPIRY_ALERT_WINDOW_DAYS: i64 = 30;

/// Expiry alerts at or below this many days are escalated to danger.
pub const EXPIRY_DANGER_DAYS: i64 = 7;
