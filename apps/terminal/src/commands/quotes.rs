//! # Quote Commands
//!
//! Quotes are durable price estimates. Converting one loads it into the
//! cart and marks it converted; the quote itself is kept.
//!
//! ```text
//!            save_quote                     convert_quote
//!  cart ─────────────────► active ───────────────────────► converted
//!                            │
//!                            │ valid_until passes
//!                            ▼
//!                         expired (derived on read, cannot convert)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kaya_core::validation::validate_valid_days;
use kaya_core::{LocalId, Quote, QuoteStatus};
use kaya_db::Database;

use crate::commands::drafts::RestoredCart;
use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState};

/// Quote request from the till.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuoteRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the configured validity
    #[serde(default)]
    pub valid_days: Option<i64>,
}

/// A quote with its status as of now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: Quote,
    pub effective_status: QuoteStatus,
}

/// Saves the cart as a quote and clears it.
pub async fn save_quote(
    db: &Database,
    cart: &CartState,
    config: &ConfigState,
    request: SaveQuoteRequest,
) -> ApiResult<Quote> {
    let valid_days = request.valid_days.unwrap_or(config.quote_valid_days);
    debug!(valid_days, "save_quote command");
    validate_valid_days(valid_days)?;

    let customer_name = request
        .customer_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let new_quote =
        cart.with_cart(|c| c.to_quote(customer_name, request.notes, valid_days, Utc::now()))?;
    let quote = db.quotes().insert(&new_quote).await?;
    cart.with_cart_mut(|c| c.clear());

    info!(quote_id = %quote.id, total = %quote.total, valid_until = %quote.valid_until, "Quote saved");
    Ok(quote)
}

/// Quotes, newest first, with expiry applied.
pub async fn list_quotes(db: &Database) -> ApiResult<Vec<QuoteView>> {
    debug!("list_quotes command");

    let now = Utc::now();
    Ok(db
        .quotes()
        .list()
        .await?
        .into_iter()
        .map(|quote| QuoteView {
            effective_status: quote.effective_status(now),
            quote,
        })
        .collect())
}

/// Loads an active, unexpired quote into the cart and marks it converted.
pub async fn convert_quote(
    db: &Database,
    cart: &CartState,
    id: LocalId,
) -> ApiResult<RestoredCart> {
    debug!(quote_id = %id, "convert_quote command");

    let quote = db
        .quotes()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote", id))?;

    let ids: Vec<LocalId> = quote.items.iter().map(|i| i.product_id).collect();
    let products = db.products().get_many(&ids).await?;

    let mut next = cart.snapshot();
    let restored = next.load_quote(&quote, &products, Utc::now())?;

    db.quotes().set_status(id, QuoteStatus::Converted).await?;
    cart.replace(next);

    let dropped = quote.items.len() - restored;
    info!(quote_id = %id, restored, dropped, "Quote converted");

    Ok(RestoredCart {
        cart: cart.response(),
        restored,
        dropped,
    })
}

pub async fn delete_quote(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(quote_id = %id, "delete_quote command");
    db.quotes().delete(id).await?;
    Ok(())
}
