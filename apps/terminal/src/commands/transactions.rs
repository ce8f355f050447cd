//! # Transaction Commands
//!
//! Read-only views over the order ledger. Drafts are parked carts, not
//! transactions, and are left out unless asked for by status.

use tracing::debug;

use kaya_core::validation::validate_search_query;
use kaya_core::{LocalId, Order, OrderStatus};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};

/// Orders, newest first. Without a status every non-draft order is listed.
pub async fn list_transactions(
    db: &Database,
    status: Option<OrderStatus>,
) -> ApiResult<Vec<Order>> {
    debug!(status = ?status, "list_transactions command");

    let orders = match status {
        Some(status) => db.orders().list_by_status(status).await?,
        None => db.orders().search("").await?,
    };
    Ok(orders)
}

/// Matches an order id fragment (`"12"` finds 12, 112, 120) or a payment
/// method (`"momo"`).
pub async fn search_transactions(db: &Database, query: &str) -> ApiResult<Vec<Order>> {
    debug!(query = %query, "search_transactions command");
    let query = validate_search_query(query)?;
    Ok(db.orders().search(&query).await?)
}

pub async fn get_transaction(db: &Database, id: LocalId) -> ApiResult<Order> {
    debug!(id = %id, "get_transaction command");
    db.orders()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::checkout::{checkout, CheckoutRequest};
    use crate::commands::drafts::save_draft;
    use crate::error::ErrorCode;
    use crate::state::tests::{product_id, test_state};
    use crate::state::AppState;
    use kaya_core::PaymentMethod;

    async fn sell(state: &AppState, barcode: &str, method: PaymentMethod) -> LocalId {
        let id = product_id(state, barcode).await;
        add_to_cart(&state.db, &state.cart, id).await.unwrap();
        checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(method),
        )
        .await
        .unwrap()
        .order_id
    }

    #[tokio::test]
    async fn test_listing_leaves_out_drafts() {
        let state = test_state().await;
        let sale = sell(&state, "1001", PaymentMethod::Cash).await;

        let coke = product_id(&state, "2002").await;
        add_to_cart(&state.db, &state.cart, coke).await.unwrap();
        save_draft(&state.db, &state.cart, None).await.unwrap();

        let all = list_transactions(&state.db, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, sale);

        let drafts = list_transactions(&state.db, Some(OrderStatus::Draft))
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn test_search_by_payment_method() {
        let state = test_state().await;
        sell(&state, "1001", PaymentMethod::Cash).await;
        let momo = sell(&state, "1002", PaymentMethod::Momo).await;

        let found = search_transactions(&state.db, "MoMo").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, momo);

        assert_eq!(get_transaction(&state.db, momo).await.unwrap().id, momo);
        let err = get_transaction(&state.db, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
