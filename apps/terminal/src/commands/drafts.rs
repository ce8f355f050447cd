//! # Draft Commands
//!
//! A draft is a parked cart: an order with status `draft` and no payments.
//! Drafts never sync.
//!
//! ```text
//!  save_draft ──► ledger (draft) ──► cart cleared
//!  load_draft ──► cart rebuilt from current products ──► draft deleted
//! ```
//!
//! Loading is one-shot. Lines whose product has since been deleted are
//! dropped without error.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use kaya_core::{LocalId, Order, OrderStatus, Product};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::state::{CartResponse, CartState};

/// Cart restored from a draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredCart {
    pub cart: CartResponse,
    pub restored: usize,
    /// Lines whose product no longer exists
    pub dropped: usize,
}

/// Saves the cart as a draft and clears it.
pub async fn save_draft(
    db: &Database,
    cart: &CartState,
    notes: Option<String>,
) -> ApiResult<Order> {
    debug!("save_draft command");

    let draft = cart.with_cart(|c| c.to_draft(notes, Utc::now()))?;
    let order = db.orders().insert(&draft).await?;
    cart.with_cart_mut(|c| c.clear());

    info!(draft_id = %order.id, total = %order.total, "Draft saved");
    Ok(order)
}

/// Drafts, newest first.
pub async fn list_drafts(db: &Database) -> ApiResult<Vec<Order>> {
    debug!("list_drafts command");
    Ok(db.orders().list_by_status(OrderStatus::Draft).await?)
}

/// Replaces the cart with a draft and deletes the draft.
pub async fn load_draft(db: &Database, cart: &CartState, id: LocalId) -> ApiResult<RestoredCart> {
    debug!(draft_id = %id, "load_draft command");

    let draft = get_draft(db, id).await?;
    let products = products_for(db, &draft).await?;

    let mut next = cart.snapshot();
    let restored = next.load_draft(&draft, &products);

    db.orders().delete(id).await?;
    cart.replace(next);

    let dropped = draft.items.len() - restored;
    info!(draft_id = %id, restored, dropped, "Draft loaded");

    Ok(RestoredCart {
        cart: cart.response(),
        restored,
        dropped,
    })
}

/// Discards a draft without loading it.
pub async fn delete_draft(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(draft_id = %id, "delete_draft command");
    get_draft(db, id).await?;
    db.orders().delete(id).await?;
    Ok(())
}

async fn get_draft(db: &Database, id: LocalId) -> ApiResult<Order> {
    let order = db
        .orders()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Draft", id))?;

    if order.status != OrderStatus::Draft {
        return Err(ApiError::business(format!(
            "Order {} is {}, not a draft",
            id, order.status
        )));
    }
    Ok(order)
}

async fn products_for(db: &Database, order: &Order) -> ApiResult<HashMap<LocalId, Product>> {
    let ids: Vec<LocalId> = order.items.iter().map(|i| i.product_id).collect();
    Ok(db.products().get_many(&ids).await?)
}
