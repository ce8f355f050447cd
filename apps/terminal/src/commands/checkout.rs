//! # Checkout Commands
//!
//! Turns the cart into a ledger record.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout(request)                                                      │
//! │      │                                                                  │
//! │      ├── 1. Price the cart snapshot (splits checked against the total)  │
//! │      ├── 2. Write the order to the ledger                               │
//! │      ├── 3. Clear the cart (only after 2 succeeds)                      │
//! │      └── 4. Return the receipt                                          │
//! │                                                                         │
//! │  kind = sale          → completed, signs as priced                      │
//! │  kind = refund        → refunded,  every amount mirrored (× −1)         │
//! │  kind = cancellation  → cancelled, every amount mirrored (× −1)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout never touches stock, and never waits on the network. The sync
//! agent picks the order up on its next pass.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kaya_core::cart::PaymentRequest;
use kaya_core::pricing::PriceLine;
use kaya_core::{CheckoutKind, LocalId, Money, Order, OrderStatus, PaymentSplit};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState};

/// Checkout request from the tender screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub kind: CheckoutKind,
    pub payment: PaymentRequest,
    #[serde(default)]
    pub customer_id: Option<LocalId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// A plain sale paid with one method.
    pub fn single(method: kaya_core::PaymentMethod) -> Self {
        CheckoutRequest {
            kind: CheckoutKind::Sale,
            payment: PaymentRequest::Single { method },
            customer_id: None,
            notes: None,
        }
    }
}

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub line_total: Money,
}

/// Receipt for a recorded checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub order_id: LocalId,
    pub status: OrderStatus,
    pub store_name: String,
    pub timestamp: String,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub tax_label: Option<String>,
    pub discount: Money,
    pub total: Money,
    pub payments: Vec<PaymentSplit>,
    /// Total formatted for display, e.g. `₵103.50`
    pub total_display: String,
}

impl ReceiptResponse {
    fn new(order: &Order, config: &ConfigState) -> Self {
        ReceiptResponse {
            order_id: order.id,
            status: order.status,
            store_name: config.store_name.clone(),
            timestamp: order.created_at.to_rfc3339(),
            items: order
                .items
                .iter()
                .map(|item| ReceiptItem {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.price,
                    discount: item.discount,
                    line_total: item.line_total(),
                })
                .collect(),
            subtotal: order.subtotal,
            tax: order.tax,
            tax_label: order.tax_rule_name.clone(),
            discount: order.discount,
            total: order.total,
            payments: order.payments.clone(),
            total_display: config.format_currency(order.total),
        }
    }
}

/// Records the cart as a completed, refunded or cancelled order.
pub async fn checkout(
    db: &Database,
    cart: &CartState,
    config: &ConfigState,
    request: CheckoutRequest,
) -> ApiResult<ReceiptResponse> {
    debug!(kind = ?request.kind, "checkout command");

    if let Some(customer_id) = request.customer_id {
        if db.customers().get(customer_id).await?.is_none() {
            return Err(ApiError::not_found("Customer", customer_id));
        }
    }

    let new_order = cart.with_cart(|c| {
        c.checkout(
            request.kind,
            &request.payment,
            request.customer_id,
            request.notes.clone(),
            Utc::now(),
        )
    })?;

    let order = db.orders().insert(&new_order).await?;
    cart.with_cart_mut(|c| c.clear());

    info!(
        order_id = %order.id,
        status = %order.status,
        total = %order.total,
        items = order.items.len(),
        "Checkout recorded"
    );

    Ok(ReceiptResponse::new(&order, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, update_quantity};
    use crate::error::ErrorCode;
    use crate::state::tests::{product_id, test_state};
    use crate::state::AppState;
    use kaya_core::PaymentMethod;

    async fn two_jollof(state: &AppState) {
        let jollof = product_id(state, "1001").await;
        add_to_cart(&state.db, &state.cart, jollof).await.unwrap();
        update_quantity(&state.cart, jollof, 2).unwrap();
    }

    #[tokio::test]
    async fn test_single_method_sale() {
        let state = test_state().await;
        two_jollof(&state).await;

        let receipt = checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(PaymentMethod::Momo),
        )
        .await
        .unwrap();

        assert_eq!(receipt.status, OrderStatus::Completed);
        assert_eq!(receipt.total, Money::from_cents(10350));
        assert_eq!(receipt.total_display, "₵103.50");
        assert_eq!(receipt.tax_label.as_deref(), Some("VAT"));
        assert_eq!(
            receipt.payments,
            vec![PaymentSplit::new(PaymentMethod::Momo, Money::from_cents(10350))]
        );
        assert!(get_cart(&state.cart).lines.is_empty());

        let stored = state.db.orders().get(receipt.order_id).await.unwrap().unwrap();
        assert!(!stored.synced);
        assert_eq!(stored.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_checkout_leaves_stock_alone() {
        let state = test_state().await;
        two_jollof(&state).await;

        checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(PaymentMethod::Cash),
        )
        .await
        .unwrap();

        let jollof = state.db.products().find_by_barcode("1001").await.unwrap().unwrap();
        assert_eq!(jollof.stock, 50);
    }

    #[tokio::test]
    async fn test_split_must_cover_total() {
        let state = test_state().await;
        two_jollof(&state).await;

        let short = CheckoutRequest {
            payment: PaymentRequest::Split {
                splits: vec![
                    PaymentSplit::new(PaymentMethod::Cash, Money::from_major(50)),
                    PaymentSplit::new(PaymentMethod::Momo, Money::from_major(50)),
                ],
            },
            ..CheckoutRequest::single(PaymentMethod::Cash)
        };
        let err = checkout(&state.db, &state.cart, &state.config, short)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(get_cart(&state.cart).lines.len(), 1);

        let exact = CheckoutRequest {
            payment: PaymentRequest::Split {
                splits: vec![
                    PaymentSplit::new(PaymentMethod::Cash, Money::from_major(50)),
                    PaymentSplit::new(PaymentMethod::Card, Money::from_cents(5350)),
                ],
            },
            ..CheckoutRequest::single(PaymentMethod::Cash)
        };
        let receipt = checkout(&state.db, &state.cart, &state.config, exact)
            .await
            .unwrap();
        assert_eq!(receipt.payments.len(), 2);
    }

    #[tokio::test]
    async fn test_refund_mirrors_the_sale() {
        let state = test_state().await;
        two_jollof(&state).await;
        let sale = checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(PaymentMethod::Cash),
        )
        .await
        .unwrap();

        two_jollof(&state).await;
        let refund = checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest {
                kind: CheckoutKind::Refund,
                ..CheckoutRequest::single(PaymentMethod::Cash)
            },
        )
        .await
        .unwrap();

        assert_ne!(refund.order_id, sale.order_id);
        assert_eq!(refund.status, OrderStatus::Refunded);
        assert_eq!(refund.total, -sale.total);
        assert_eq!(refund.subtotal, -sale.subtotal);
        assert_eq!(refund.tax, -sale.tax);
        assert_eq!(refund.items[0].quantity, -2);
        assert_eq!(refund.payments[0].amount(), -sale.total);
        assert_eq!(refund.total_display, "-₵103.50");

        let original = state.db.orders().get(sale.order_id).await.unwrap().unwrap();
        assert_eq!(original.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_cart_and_unknown_customer() {
        let state = test_state().await;

        let err = checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest::single(PaymentMethod::Cash),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        two_jollof(&state).await;
        let err = checkout(
            &state.db,
            &state.cart,
            &state.config,
            CheckoutRequest {
                customer_id: Some(404),
                ..CheckoutRequest::single(PaymentMethod::Credit)
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(get_cart(&state.cart).lines.len(), 1);
    }
}
