//! # Cart Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────────────────────┐     │
//! │  │  Empty   │────►│ Building │────►│ completed / draft / quote    │     │
//! │  │  Cart    │     │          │     │ (checkout.rs, drafts.rs,     │     │
//! │  └──────────┘     └──────────┘     │  quotes.rs)                  │     │
//! │       ▲                │           └──────────────────────────────┘     │
//! │       │           add_to_cart                     │                     │
//! │       │           scan_key                        │                     │
//! │       │           update_quantity                 │                     │
//! │       │           set_line_discount               │                     │
//! │       │           set_order_discount              │                     │
//! │       │           set_tax_rule                    │                     │
//! │       └────────── clear_cart ◄────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is advisory: nothing here checks or reserves it.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use kaya_core::cart::AppliedTax;
use kaya_core::scanner::{ScanEvent, ScanKey};
use kaya_core::validation::validate_line_discount;
use kaya_core::{CoreError, LocalId, Money, OrderDiscount};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::state::{CartResponse, CartState, ConfigState};

/// Result of feeding one keystroke to the scanner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Part of a burst; nothing to do yet.
    Pending,
    /// Human typing or a code too short to be a scan.
    Ignored,
    /// A scanned barcode matched a product and was added.
    Added { barcode: String, cart: CartResponse },
    /// A scanned barcode matched nothing. Not an error.
    NotFound { barcode: String },
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState) -> CartResponse {
    debug!("get_cart command");
    cart.response()
}

/// Adds one unit of an active product.
pub async fn add_to_cart(
    db: &Database,
    cart: &CartState,
    product_id: LocalId,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, "add_to_cart command");

    let product = db
        .products()
        .get(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(CoreError::ProductNotFound(product_id))?;

    Ok(cart.with_cart_mut(|c| {
        c.add_line(&product);
        CartResponse::from(&*c)
    }))
}

/// Feeds a keystroke that arrived at `at`. A completed scan is looked up by
/// barcode and added like [`add_to_cart`].
pub async fn scan_key(
    db: &Database,
    cart: &CartState,
    key: ScanKey,
    at: Instant,
) -> ApiResult<ScanOutcome> {
    let barcode = match cart.push_key(key, at) {
        ScanEvent::Pending => return Ok(ScanOutcome::Pending),
        ScanEvent::Ignored => return Ok(ScanOutcome::Ignored),
        ScanEvent::Scanned(code) => code,
    };
    debug!(barcode = %barcode, "Barcode scanned");

    match db.products().find_by_barcode(&barcode).await? {
        Some(product) if product.is_active => {
            let response = cart.with_cart_mut(|c| {
                c.add_line(&product);
                CartResponse::from(&*c)
            });
            Ok(ScanOutcome::Added {
                barcode,
                cart: response,
            })
        }
        _ => {
            debug!(barcode = %barcode, "No product for scanned barcode");
            Ok(ScanOutcome::NotFound { barcode })
        }
    }
}

/// Sets a line's quantity. Zero or less removes the line.
pub fn update_quantity(
    cart: &CartState,
    product_id: LocalId,
    quantity: i64,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, quantity, "update_quantity command");

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.set_quantity(product_id, quantity)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Sets a flat per-unit discount on a line.
pub fn set_line_discount(
    cart: &CartState,
    product_id: LocalId,
    discount: Money,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, discount = %discount, "set_line_discount command");
    validate_line_discount(discount)?;

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.set_line_discount(product_id, discount)?;
        Ok(CartResponse::from(&*c))
    })
}

pub fn remove_from_cart(cart: &CartState, product_id: LocalId) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.remove_line(product_id)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Replaces the order-level discount.
pub fn set_order_discount(cart: &CartState, discount: OrderDiscount) -> ApiResult<CartResponse> {
    debug!(amount = %discount.amount, kind = discount.kind.as_str(), "set_order_discount command");

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.set_order_discount(discount)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Applies an active tax rule, or the configured default rate when
/// `rule_id` is `None`.
pub async fn set_tax_rule(
    db: &Database,
    cart: &CartState,
    config: &ConfigState,
    rule_id: Option<LocalId>,
) -> ApiResult<CartResponse> {
    debug!(rule_id = ?rule_id, "set_tax_rule command");

    let tax = match rule_id {
        Some(id) => {
            let rule = db
                .tax_rules()
                .get(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Tax rule", id))?;
            if !rule.is_active {
                return Err(ApiError::business(format!(
                    "Tax rule '{}' is inactive",
                    rule.name
                )));
            }
            AppliedTax::from_rule(&rule)
        }
        None => AppliedTax::rate(config.default_tax_rate),
    };

    Ok(cart.with_cart_mut(|c| {
        c.set_tax(tax);
        CartResponse::from(&*c)
    }))
}

pub fn clear_cart(cart: &CartState) -> CartResponse {
    debug!("clear_cart command");
    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::from(&*c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::tests::{product_id, test_state};
    use kaya_core::{NewTaxRule, TaxRate};
    use rust_decimal::Decimal;
    use std::time::Duration;

    #[tokio::test]
    async fn test_add_increments_existing_line() {
        let state = test_state().await;
        let jollof = product_id(&state, "1001").await;

        add_to_cart(&state.db, &state.cart, jollof).await.unwrap();
        let response = add_to_cart(&state.db, &state.cart, jollof).await.unwrap();

        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.lines[0].quantity, 2);
        assert_eq!(response.totals.subtotal, Money::from_major(90));
        assert_eq!(response.totals.tax, Money::from_cents(1350));
        assert_eq!(response.totals.total, Money::from_cents(10350));
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_added() {
        let state = test_state().await;
        let alvaro = product_id(&state, "2003").await;
        state.db.products().set_active(alvaro, false).await.unwrap();

        let err = add_to_cart(&state.db, &state.cart, alvaro).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(get_cart(&state.cart).lines.is_empty());
    }

    #[tokio::test]
    async fn test_percentage_discount() {
        let state = test_state().await;
        let jollof = product_id(&state, "1001").await;
        add_to_cart(&state.db, &state.cart, jollof).await.unwrap();
        update_quantity(&state.cart, jollof, 2).unwrap();

        let response =
            set_order_discount(&state.cart, OrderDiscount::percentage(Decimal::from(10))).unwrap();
        assert_eq!(response.totals.discount, Money::from_cents(1035));
        assert_eq!(response.totals.total, Money::from_cents(9315));

        let err = set_order_discount(&state.cart, OrderDiscount::percentage(Decimal::from(101)))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let state = test_state().await;
        let water = product_id(&state, "2004").await;
        add_to_cart(&state.db, &state.cart, water).await.unwrap();

        let response = update_quantity(&state.cart, water, 0).unwrap();
        assert!(response.lines.is_empty());

        let err = update_quantity(&state.cart, water, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_oversized_quantity_leaves_cart_usable() {
        let state = test_state().await;
        let jollof = product_id(&state, "1001").await;
        add_to_cart(&state.db, &state.cart, jollof).await.unwrap();

        let err = update_quantity(&state.cart, jollof, i64::MAX).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let cart = get_cart(&state.cart);
        assert_eq!(cart.lines[0].quantity, 1);
        assert_eq!(cart.totals.subtotal, Money::from_major(45));
    }

    #[tokio::test]
    async fn test_line_discount_rejects_negative() {
        let state = test_state().await;
        let coke = product_id(&state, "2002").await;
        add_to_cart(&state.db, &state.cart, coke).await.unwrap();

        let response = set_line_discount(&state.cart, coke, Money::from_major(1)).unwrap();
        assert_eq!(response.totals.subtotal, Money::from_major(7));

        let err = set_line_discount(&state.cart, coke, Money::from_major(-1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_scan_adds_matching_product() {
        let state = test_state().await;
        let start = Instant::now();
        let step = Duration::from_millis(10);

        let mut outcome = ScanOutcome::Pending;
        for (i, c) in "2001".chars().enumerate() {
            outcome = scan_key(&state.db, &state.cart, ScanKey::Char(c), start + step * i as u32)
                .await
                .unwrap();
        }
        assert_eq!(outcome, ScanOutcome::Pending);

        let outcome = scan_key(&state.db, &state.cart, ScanKey::Enter, start + step * 4)
            .await
            .unwrap();
        match outcome {
            ScanOutcome::Added { barcode, cart } => {
                assert_eq!(barcode, "2001");
                assert_eq!(cart.lines[0].name, "Sobolo (500ml)");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_unknown_barcode_is_not_an_error() {
        let state = test_state().await;
        let start = Instant::now();
        let step = Duration::from_millis(5);

        for (i, c) in "9999".chars().enumerate() {
            scan_key(&state.db, &state.cart, ScanKey::Char(c), start + step * i as u32)
                .await
                .unwrap();
        }
        let outcome = scan_key(&state.db, &state.cart, ScanKey::Enter, start + step * 4)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ScanOutcome::NotFound {
                barcode: "9999".into()
            }
        );
        assert!(get_cart(&state.cart).lines.is_empty());
    }

    #[tokio::test]
    async fn test_tax_rule_selection() {
        let state = test_state().await;
        let nhil = state
            .db
            .tax_rules()
            .insert(&NewTaxRule {
                name: "NHIL".into(),
                rate: TaxRate::from_percent(5).unwrap(),
                is_default: false,
                is_active: true,
            })
            .await
            .unwrap();

        let response = set_tax_rule(&state.db, &state.cart, &state.config, Some(nhil.id))
            .await
            .unwrap();
        assert_eq!(response.tax.name.as_deref(), Some("NHIL"));

        let response = set_tax_rule(&state.db, &state.cart, &state.config, None)
            .await
            .unwrap();
        assert_eq!(response.tax.name, None);
        assert_eq!(response.tax.rate, state.config.default_tax_rate);

        let err = set_tax_rule(&state.db, &state.cart, &state.config, Some(999))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_keeps_tax_selection() {
        let state = test_state().await;
        let waakye = product_id(&state, "1004").await;
        add_to_cart(&state.db, &state.cart, waakye).await.unwrap();

        let response = clear_cart(&state.cart);
        assert!(response.lines.is_empty());
        assert_eq!(response.tax.name.as_deref(), Some("VAT"));
    }
}
