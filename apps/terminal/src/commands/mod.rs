//! # Commands Module
//!
//! Every operation the till front end can call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs           ◄─── You are here (exports)
//! ├── cart.rs          ◄─── Cart edits, barcode keystrokes, tax selection
//! ├── checkout.rs      ◄─── Sale / refund / cancellation, receipts
//! ├── drafts.rs        ◄─── Park and restore carts
//! ├── quotes.rs        ◄─── Price estimates and conversion
//! ├── inventory.rs     ◄─── Products, categories, variants
//! ├── batches.rs       ◄─── Received lots and their stock effect
//! ├── tax_rules.rs     ◄─── Named tax rates, default rule
//! ├── customers.rs     ◄─── Customer directory
//! ├── transactions.rs  ◄─── Order history and search
//! ├── alerts.rs        ◄─── Low-stock and expiry alerts
//! ├── dashboard.rs     ◄─── Revenue summary
//! ├── config.rs        ◄─── Store settings
//! └── sync.rs          ◄─── Sync status and manual triggers
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  front end                                                              │
//! │      │  add_to_cart(product_id)                                         │
//! │      ▼                                                                  │
//! │  command(db: &Database, cart: &CartState, ...)                          │
//! │      │  validate ─► kaya-core rules ─► kaya-db write                    │
//! │      ▼                                                                  │
//! │  Result<Dto, ApiError> ─► JSON                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only the ledger
//! search_products(&state.db, "rice", None).await?;
//!
//! // Only the cart
//! get_cart(&state.cart);
//!
//! // Ledger, cart and store settings
//! checkout(&state.db, &state.cart, &state.config, request).await?;
//! ```

pub mod alerts;
pub mod batches;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod drafts;
pub mod inventory;
pub mod quotes;
pub mod sync;
pub mod tax_rules;
pub mod transactions;
