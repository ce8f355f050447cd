//! # Cart State
//!
//! The session cart plus the barcode scanner buffer feeding it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartState                                        │
//! │                                                                         │
//! │   commands ──► with_cart(|c| ...)      read  ──┐                        │
//! │   commands ──► with_cart_mut(|c| ...)  write ──┼──► Arc<Mutex<Cart>>    │
//! │   commands ──► replace(next)           swap  ──┘                        │
//! │                                                                         │
//! │   keystrokes ──► push_key(key, at) ──► Arc<Mutex<BarcodeScanner>>       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Locks are never held across an `.await`. A command that needs the ledger
//! takes a snapshot, does its I/O, then writes the result back.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;

use kaya_core::cart::{AppliedTax, Cart, CartLine};
use kaya_core::scanner::{BarcodeScanner, ScanEvent, ScanKey};
use kaya_core::{Money, OrderDiscount};

/// Cart totals for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let breakdown = cart.breakdown();
        CartTotals {
            item_count: cart.lines().len(),
            total_quantity: cart.total_quantity(),
            subtotal: breakdown.subtotal,
            tax: breakdown.tax,
            discount: breakdown.discount,
            total: breakdown.total,
        }
    }
}

/// Cart contents as returned to the till.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub discount: OrderDiscount,
    pub tax: AppliedTax,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines().to_vec(),
            discount: *cart.discount(),
            tax: cart.tax().clone(),
            totals: CartTotals::from(cart),
        }
    }
}

/// Shared cart state for the session.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    scanner: Arc<Mutex<BarcodeScanner>>,
}

impl CartState {
    /// Creates an empty cart under `tax`.
    pub fn new(tax: AppliedTax) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new(tax))),
            scanner: Arc::new(Mutex::new(BarcodeScanner::default())),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    /// Copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    /// Swaps in a cart prepared elsewhere (a restored draft or quote).
    pub fn replace(&self, next: Cart) {
        self.with_cart_mut(|cart| *cart = next);
    }

    pub fn response(&self) -> CartResponse {
        self.with_cart(|cart| CartResponse::from(cart))
    }

    /// Feeds one keystroke to the scanner buffer.
    pub fn push_key(&self, key: ScanKey, at: Instant) -> ScanEvent {
        let mut scanner = self.scanner.lock().unwrap_or_else(PoisonError::into_inner);
        scanner.push(key, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kaya_core::{Product, TaxRate};
    use std::time::Duration;

    fn product(id: i64, price: i64) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            price: Money::from_major(price),
            category: "Food".into(),
            category_id: None,
            stock: 10,
            low_stock_threshold: 5,
            barcode: None,
            sku: None,
            image: None,
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn state() -> CartState {
        CartState::new(AppliedTax::rate(TaxRate::from_percent(15).unwrap()))
    }

    #[test]
    fn test_response_carries_totals() {
        let cart = state();
        cart.with_cart_mut(|c| {
            c.add_line(&product(1, 45));
            c.add_line(&product(1, 45));
        });

        let response = cart.response();
        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.totals.total_quantity, 2);
        assert_eq!(response.totals.subtotal, Money::from_major(90));
        assert_eq!(response.totals.total, Money::from_cents(10350));
    }

    #[test]
    fn test_replace_swaps_whole_cart() {
        let cart = state();
        let mut next = cart.snapshot();
        next.add_line(&product(2, 10));

        assert!(cart.with_cart(Cart::is_empty));
        cart.replace(next);
        assert_eq!(cart.response().totals.item_count, 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let cart = state();
        let poisoner = cart.clone();
        let _ = std::thread::spawn(move || {
            poisoner.with_cart_mut(|_| panic!("boom"));
        })
        .join();

        cart.with_cart_mut(|c| c.add_line(&product(3, 8)));
        assert_eq!(cart.response().totals.item_count, 1);
    }

    #[test]
    fn test_scanner_burst() {
        let cart = state();
        let start = Instant::now();
        let step = Duration::from_millis(10);

        assert_eq!(cart.push_key(ScanKey::Char('1'), start), ScanEvent::Pending);
        assert_eq!(cart.push_key(ScanKey::Char('0'), start + step), ScanEvent::Pending);
        assert_eq!(
            cart.push_key(ScanKey::Enter, start + step * 2),
            ScanEvent::Scanned("10".into())
        );
    }
}
