//! # Cart
//!
//! The in-memory cart and the transitions out of it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   empty ──add_line──► building ◄──┐ add_line / set_quantity /           │
//! │     ▲                    │  │     │ set_line_discount / remove_line /   │
//! │     │                    │  └─────┘ set_order_discount / set_tax        │
//! │     │                    │                                              │
//! │     │     ┌──────────────┼─────────────────┐                            │
//! │     │     ▼              ▼                 ▼                            │
//! │     │  checkout()     to_draft()        to_quote()                      │
//! │     │  NewOrder       NewOrder          NewQuote                        │
//! │     │  completed /    draft             active                          │
//! │     │  refunded /     (no payments)     (valid_until)                   │
//! │     │  cancelled                                                        │
//! │     │     │              │                 │                            │
//! │     └─────┴── clear() ───┴─────────────────┘  once the ledger write     │
//! │                                               has succeeded             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart never touches the ledger. Each transition returns the record to
//! write; the caller clears the cart only after the write succeeds, so a
//! failed write leaves the cart as it was.
//!
//! Adding a line performs no stock check. Stock is advisory and checkout
//! does not deplete it.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::{
    CheckoutKind, NewOrder, NewQuote, Order, OrderItem, OrderStatus, PaymentMethod, PaymentSplit,
    Quote,
};
use crate::pricing::{
    invert_discount, payments_match, price_lines, DiscountType, OrderDiscount, PriceBreakdown,
    PriceLine,
};
use crate::types::{LocalId, Product, TaxRate, TaxRule};
use crate::validation::{
    validate_line_discount, validate_order_discount, validate_valid_days, MAX_LINE_QUANTITY,
};

// =============================================================================
// Cart Line
// =============================================================================

/// A product snapshot plus the transient quantity and per-unit discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: LocalId,
    pub name: String,
    /// Price frozen when the line was added.
    pub price: Money,
    pub category: String,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub quantity: i64,
    /// Flat discount per unit.
    pub discount: Money,
}

impl CartLine {
    /// A fresh line: quantity 1, no discount.
    pub fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            barcode: product.barcode.clone(),
            sku: product.sku.clone(),
            quantity: 1,
            discount: Money::ZERO,
        }
    }

    fn to_item(&self, multiplier: i64) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity * multiplier,
            discount: self.discount,
        }
    }
}

impl PriceLine for CartLine {
    fn unit_price(&self) -> Money {
        self.price
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_discount(&self) -> Money {
        self.discount
    }
}

// =============================================================================
// Applied Tax
// =============================================================================

/// The tax currently applied to the cart: a named rule or a bare rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedTax {
    pub name: Option<String>,
    pub rate: TaxRate,
}

impl AppliedTax {
    /// A bare rate with no rule name (the configured default).
    pub fn rate(rate: TaxRate) -> Self {
        AppliedTax { name: None, rate }
    }

    pub fn from_rule(rule: &TaxRule) -> Self {
        AppliedTax {
            name: Some(rule.name.clone()),
            rate: rule.rate,
        }
    }
}

// =============================================================================
// Payment Request
// =============================================================================

/// How the customer is paying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaymentRequest {
    /// One method covering the whole total.
    Single { method: PaymentMethod },
    /// Several legs that must add up to the total.
    Split { splits: Vec<PaymentSplit> },
}

// =============================================================================
// Cart
// =============================================================================

/// The session cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - Every line has quantity > 0 (setting 0 or less removes it)
/// - The order discount is valid (percentage ≤ 100, never negative)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: OrderDiscount,
    tax: AppliedTax,
}

impl Cart {
    /// Creates an empty cart under `tax`.
    pub fn new(tax: AppliedTax) -> Self {
        Cart {
            lines: Vec::new(),
            discount: OrderDiscount::none(),
            tax,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn discount(&self) -> &OrderDiscount {
        &self.discount
    }

    pub fn tax(&self) -> &AppliedTax {
        &self.tax
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Current price breakdown.
    pub fn breakdown(&self) -> PriceBreakdown {
        price_lines(&self.lines, self.tax.rate, &self.discount)
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Adds one unit of `product`: increments an existing line or appends a
    /// new one. A line already at [`MAX_LINE_QUANTITY`] stays there.
    pub fn add_line(&mut self, product: &Product) {
        match self.line_mut(product.id) {
            Some(line) => line.quantity = (line.quantity + 1).min(MAX_LINE_QUANTITY),
            None => self.lines.push(CartLine::from_product(product)),
        }
    }

    /// Sets a line's quantity. Zero or less removes the line; more than
    /// [`MAX_LINE_QUANTITY`] is rejected and the line is left as it was.
    pub fn set_quantity(&mut self, product_id: LocalId, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_line(product_id);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                product_id,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .line_mut(product_id)
            .ok_or(CoreError::LineNotInCart(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Sets the flat per-unit discount on a line.
    pub fn set_line_discount(&mut self, product_id: LocalId, discount: Money) -> CoreResult<()> {
        validate_line_discount(discount)?;

        let line = self
            .line_mut(product_id)
            .ok_or(CoreError::LineNotInCart(product_id))?;
        line.discount = discount;
        Ok(())
    }

    pub fn remove_line(&mut self, product_id: LocalId) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            return Err(CoreError::LineNotInCart(product_id));
        }
        Ok(())
    }

    /// Replaces the order-level discount.
    pub fn set_order_discount(&mut self, discount: OrderDiscount) -> CoreResult<()> {
        validate_order_discount(&discount)?;
        self.discount = discount;
        Ok(())
    }

    pub fn set_tax(&mut self, tax: AppliedTax) {
        self.tax = tax;
    }

    /// Empties the cart and resets the order discount. The tax selection
    /// is kept for the next sale.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = OrderDiscount::none();
    }

    fn line_mut(&mut self, product_id: LocalId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Items and breakdown with `multiplier` applied to every sign.
    fn snapshot(&self, multiplier: i64) -> (Vec<OrderItem>, PriceBreakdown) {
        let items = self.lines.iter().map(|l| l.to_item(multiplier)).collect();
        let breakdown = self.breakdown();
        let breakdown = if multiplier < 0 {
            breakdown.mirrored()
        } else {
            breakdown
        };
        (items, breakdown)
    }

    fn discount_type(&self, breakdown: &PriceBreakdown) -> Option<DiscountType> {
        (!breakdown.discount.is_zero()).then_some(self.discount.kind)
    }

    /// Builds the order for a checkout.
    ///
    /// Split payments are checked against the sale total before any
    /// mirroring. For refunds and cancellations the recorded payments are
    /// sign-flipped along with everything else.
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use kaya_core::cart::{AppliedTax, Cart, PaymentRequest};
    /// use kaya_core::{CheckoutKind, Money, OrderStatus, PaymentMethod, TaxRate};
    /// # use kaya_core::Product;
    /// # let product = Product {
    /// #     id: 1, name: "Jollof Rice & Chicken".into(), price: Money::from_major(45),
    /// #     category: "Food".into(), category_id: None, stock: 50, low_stock_threshold: 10,
    /// #     barcode: None, sku: None, image: None, description: None, is_active: true,
    /// #     created_at: Utc::now(), updated_at: Utc::now(),
    /// # };
    ///
    /// let mut cart = Cart::new(AppliedTax::rate(TaxRate::from_percent(15).unwrap()));
    /// cart.add_line(&product);
    /// cart.add_line(&product);
    ///
    /// let payment = PaymentRequest::Single { method: PaymentMethod::Cash };
    /// let order = cart.checkout(CheckoutKind::Sale, &payment, None, None, Utc::now()).unwrap();
    /// assert_eq!(order.status, OrderStatus::Completed);
    /// assert_eq!(order.total.to_string(), "103.50");
    /// ```
    pub fn checkout(
        &self,
        kind: CheckoutKind,
        payment: &PaymentRequest,
        customer_id: Option<LocalId>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<NewOrder> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let sale_total = self.breakdown().total;
        let payments = match payment {
            PaymentRequest::Single { method } => vec![PaymentSplit::new(*method, sale_total)],
            PaymentRequest::Split { splits } => {
                if !payments_match(splits, sale_total) {
                    return Err(CoreError::PaymentMismatch {
                        paid: splits.iter().map(PaymentSplit::amount).sum(),
                        total: sale_total,
                    });
                }
                splits.clone()
            }
        };

        let multiplier = kind.multiplier();
        let (items, breakdown) = self.snapshot(multiplier);
        let payments = if multiplier < 0 {
            payments.iter().map(PaymentSplit::mirrored).collect()
        } else {
            payments
        };

        Ok(NewOrder {
            items,
            subtotal: breakdown.subtotal,
            tax: breakdown.tax,
            tax_rule_name: self.tax.name.clone(),
            tax_rate: Some(self.tax.rate),
            discount: breakdown.discount,
            discount_type: self.discount_type(&breakdown),
            total: breakdown.total,
            status: kind.status(),
            payments,
            customer_id,
            notes,
            created_at: now,
        })
    }

    /// Builds a draft: the priced cart with no payments.
    pub fn to_draft(&self, notes: Option<String>, now: DateTime<Utc>) -> CoreResult<NewOrder> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let (items, breakdown) = self.snapshot(1);
        Ok(NewOrder {
            items,
            subtotal: breakdown.subtotal,
            tax: breakdown.tax,
            tax_rule_name: self.tax.name.clone(),
            tax_rate: Some(self.tax.rate),
            discount: breakdown.discount,
            discount_type: self.discount_type(&breakdown),
            total: breakdown.total,
            status: OrderStatus::Draft,
            payments: Vec::new(),
            customer_id: None,
            notes,
            created_at: now,
        })
    }

    /// Builds a quote valid for `valid_days` from `now`.
    pub fn to_quote(
        &self,
        customer_name: Option<String>,
        notes: Option<String>,
        valid_days: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<NewQuote> {
        validate_valid_days(valid_days)?;
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let (items, breakdown) = self.snapshot(1);
        Ok(NewQuote {
            items,
            subtotal: breakdown.subtotal,
            tax: breakdown.tax,
            tax_rule_name: self.tax.name.clone(),
            tax_rate: Some(self.tax.rate),
            discount: breakdown.discount,
            discount_type: self.discount_type(&breakdown),
            total: breakdown.total,
            customer_name,
            notes,
            valid_until: now + Duration::days(valid_days),
            created_at: now,
        })
    }

    // -------------------------------------------------------------------------
    // Restoring
    // -------------------------------------------------------------------------

    /// Replaces the cart with a draft's lines.
    ///
    /// Lines whose product no longer exists are dropped silently. Returns the
    /// number of lines restored.
    pub fn load_draft(&mut self, draft: &Order, products: &HashMap<LocalId, Product>) -> usize {
        self.lines = restore_lines(&draft.items, products);
        self.restore_pricing(
            draft.discount,
            draft.discount_type,
            draft.subtotal,
            draft.tax_rule_name.as_deref(),
            draft.tax_rate,
        );
        self.lines.len()
    }

    /// Replaces the cart with a quote's lines, discount and tax.
    ///
    /// ## Errors
    /// - `QuoteNotConvertible` if the quote is converted or expired at `now`
    /// - `QuoteUnavailable` if none of its products exist any more
    pub fn load_quote(
        &mut self,
        quote: &Quote,
        products: &HashMap<LocalId, Product>,
        now: DateTime<Utc>,
    ) -> CoreResult<usize> {
        if !quote.is_convertible(now) {
            return Err(CoreError::QuoteNotConvertible {
                id: quote.id,
                status: quote.effective_status(now).to_string(),
            });
        }

        let lines = restore_lines(&quote.items, products);
        if lines.is_empty() {
            return Err(CoreError::QuoteUnavailable);
        }

        self.lines = lines;
        self.restore_pricing(
            quote.discount,
            quote.discount_type,
            quote.subtotal,
            quote.tax_rule_name.as_deref(),
            quote.tax_rate,
        );
        Ok(self.lines.len())
    }

    fn restore_pricing(
        &mut self,
        discount: Money,
        discount_type: Option<DiscountType>,
        subtotal: Money,
        tax_rule_name: Option<&str>,
        tax_rate: Option<TaxRate>,
    ) {
        if let Some(rate) = tax_rate {
            self.tax = AppliedTax {
                name: tax_rule_name.map(str::to_string),
                rate,
            };
        }

        self.discount = match discount_type {
            Some(kind) if discount > Money::ZERO => {
                invert_discount(discount, kind, subtotal, self.tax.rate)
            }
            _ => OrderDiscount::none(),
        };
    }
}

/// Rebuilds cart lines from stored items against the current catalogue.
///
/// Current product data (price included) is used; quantity and per-unit
/// discount come from the item. Items whose product is gone are omitted.
pub fn restore_lines(items: &[OrderItem], products: &HashMap<LocalId, Product>) -> Vec<CartLine> {
    items
        .iter()
        .filter_map(|item| {
            let product = products.get(&item.product_id)?;
            Some(CartLine {
                quantity: item.quantity,
                discount: item.discount,
                ..CartLine::from_product(product)
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::QuoteStatus;
    use rust_decimal::Decimal;

    fn product(id: LocalId, name: &str, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: name.to_string(),
            price: Money::from_major(price),
            category: "Food".to_string(),
            category_id: Some(1),
            stock: 50,
            low_stock_threshold: 10,
            barcode: Some(format!("{}", 1000 + id)),
            sku: None,
            image: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn vat_cart() -> Cart {
        Cart::new(AppliedTax {
            name: Some("VAT".to_string()),
            rate: TaxRate::from_percent(15).unwrap(),
        })
    }

    fn cash() -> PaymentRequest {
        PaymentRequest::Single {
            method: PaymentMethod::Cash,
        }
    }

    fn catalogue(products: &[Product]) -> HashMap<LocalId, Product> {
        products.iter().map(|p| (p.id, p.clone())).collect()
    }

    #[test]
    fn test_add_line_increments_existing() {
        let jollof = product(1, "Jollof", 45);
        let mut cart = vat_cart();
        cart.add_line(&jollof);
        cart.add_line(&jollof);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].discount, Money::ZERO);
    }

    #[test]
    fn test_add_line_ignores_stock() {
        let mut sold_out = product(1, "Jollof", 45);
        sold_out.stock = 0;
        let mut cart = vat_cart();
        cart.add_line(&sold_out);
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        cart.add_line(&product(2, "Waakye", 35));

        cart.set_quantity(1, 0).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, 2);

        cart.set_quantity(2, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_missing_line() {
        let mut cart = vat_cart();
        assert!(matches!(
            cart.set_quantity(9, 2),
            Err(CoreError::LineNotInCart(9))
        ));
    }

    #[test]
    fn test_set_quantity_above_limit_rejected() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof Rice & Chicken", 45));

        assert!(matches!(
            cart.set_quantity(1, i64::MAX),
            Err(CoreError::QuantityTooLarge { product_id: 1, .. })
        ));
        assert_eq!(cart.lines()[0].quantity, 1);

        cart.set_quantity(1, MAX_LINE_QUANTITY).unwrap();
        cart.add_line(&product(1, "Jollof Rice & Chicken", 45));
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_largest_accepted_line_prices_without_overflow() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Generator", crate::validation::MAX_PRICE));
        cart.set_quantity(1, MAX_LINE_QUANTITY).unwrap();
        cart.set_order_discount(OrderDiscount::percentage(Decimal::from(10)))
            .unwrap();

        let b = cart.breakdown();
        let subtotal = Money::from_major(crate::validation::MAX_PRICE * MAX_LINE_QUANTITY);
        assert_eq!(b.subtotal, subtotal);
        assert!(b.total > subtotal);
    }

    #[test]
    fn test_order_discount_replaces() {
        let mut cart = vat_cart();
        cart.set_order_discount(OrderDiscount::flat(Money::from_major(5)))
            .unwrap();
        cart.set_order_discount(OrderDiscount::percentage(Decimal::from(10)))
            .unwrap();
        assert_eq!(cart.discount().kind, DiscountType::Percentage);
        assert_eq!(cart.discount().amount, Decimal::from(10));

        assert!(cart
            .set_order_discount(OrderDiscount::percentage(Decimal::from(150)))
            .is_err());
        // A rejected discount leaves the previous one in place
        assert_eq!(cart.discount().amount, Decimal::from(10));
    }

    #[test]
    fn test_checkout_empty_cart() {
        let cart = vat_cart();
        let result = cart.checkout(CheckoutKind::Sale, &cash(), None, None, Utc::now());
        assert!(matches!(result, Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_checkout_single_method_pays_total() {
        let mut cart = vat_cart();
        let jollof = product(1, "Jollof", 45);
        cart.add_line(&jollof);
        cart.add_line(&jollof);

        let order = cart
            .checkout(CheckoutKind::Sale, &cash(), Some(3), None, Utc::now())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.subtotal, Money::from_major(90));
        assert_eq!(order.tax, Money::from_cents(1350));
        assert_eq!(order.total, Money::from_cents(10350));
        assert_eq!(order.tax_rule_name.as_deref(), Some("VAT"));
        assert_eq!(order.discount_type, None);
        assert_eq!(order.customer_id, Some(3));
        assert_eq!(
            order.payments,
            vec![PaymentSplit::new(PaymentMethod::Cash, Money::from_cents(10350))]
        );
    }

    #[test]
    fn test_checkout_split_must_match_total() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        cart.set_quantity(1, 2).unwrap();

        let short = PaymentRequest::Split {
            splits: vec![
                PaymentSplit::new(PaymentMethod::Cash, Money::from_major(50)),
                PaymentSplit::new(PaymentMethod::Momo, Money::from_major(50)),
            ],
        };
        assert!(matches!(
            cart.checkout(CheckoutKind::Sale, &short, None, None, Utc::now()),
            Err(CoreError::PaymentMismatch { .. })
        ));

        let exact = PaymentRequest::Split {
            splits: vec![
                PaymentSplit::new(PaymentMethod::Cash, Money::from_major(50)),
                PaymentSplit::new(PaymentMethod::Momo, Money::from_cents(5350)),
            ],
        };
        let order = cart
            .checkout(CheckoutKind::Sale, &exact, None, None, Utc::now())
            .unwrap();
        assert_eq!(order.payments.len(), 2);
    }

    #[test]
    fn test_refund_is_mirror_of_sale() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        cart.set_quantity(1, 2).unwrap();
        cart.set_order_discount(OrderDiscount::percentage(Decimal::from(10)))
            .unwrap();

        let now = Utc::now();
        let sale = cart
            .checkout(CheckoutKind::Sale, &cash(), None, None, now)
            .unwrap();
        let refund = cart
            .checkout(CheckoutKind::Refund, &cash(), None, None, now)
            .unwrap();

        assert_eq!(refund.status, OrderStatus::Refunded);
        assert_eq!(refund.subtotal, -sale.subtotal);
        assert_eq!(refund.tax, -sale.tax);
        assert_eq!(refund.discount, -sale.discount);
        assert_eq!(refund.total, Money::from_cents(-9315));
        assert_eq!(refund.items[0].quantity, -2);
        assert_eq!(refund.payments[0].amount(), Money::from_cents(-9315));
        assert_eq!(refund.discount_type, Some(DiscountType::Percentage));

        let cancel = cart
            .checkout(CheckoutKind::Cancellation, &cash(), None, None, now)
            .unwrap();
        assert_eq!(cancel.status, OrderStatus::Cancelled);
        assert_eq!(cancel.total, refund.total);
    }

    #[test]
    fn test_draft_has_no_payments() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        let draft = cart.to_draft(Some("table 4".into()), Utc::now()).unwrap();
        assert_eq!(draft.status, OrderStatus::Draft);
        assert!(draft.payments.is_empty());
        assert_eq!(draft.notes.as_deref(), Some("table 4"));
    }

    #[test]
    fn test_quote_validity_window() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        let now = Utc::now();
        let quote = cart.to_quote(Some("Kofi".into()), None, 7, now).unwrap();
        assert_eq!(quote.valid_until, now + Duration::days(7));
        assert!(cart.to_quote(None, None, 0, now).is_err());
    }

    #[test]
    fn test_clear_resets_discount_keeps_tax() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        cart.set_order_discount(OrderDiscount::flat(Money::from_major(5)))
            .unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.discount().is_none());
        assert_eq!(cart.tax().name.as_deref(), Some("VAT"));
    }

    #[test]
    fn test_restore_lines_uses_current_price_and_skips_deleted() {
        let items = vec![
            OrderItem {
                product_id: 1,
                name: "Jollof".into(),
                price: Money::from_major(40),
                quantity: 3,
                discount: Money::from_major(1),
            },
            OrderItem {
                product_id: 99,
                name: "Gone".into(),
                price: Money::from_major(10),
                quantity: 1,
                discount: Money::ZERO,
            },
        ];
        let lines = restore_lines(&items, &catalogue(&[product(1, "Jollof", 45)]));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price, Money::from_major(45));
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].discount, Money::from_major(1));
    }

    fn saved_quote(cart: &Cart, now: DateTime<Utc>) -> Quote {
        let new = cart.to_quote(Some("Kofi".into()), None, 7, now).unwrap();
        Quote {
            id: 1,
            items: new.items,
            subtotal: new.subtotal,
            tax: new.tax,
            tax_rule_name: new.tax_rule_name,
            tax_rate: new.tax_rate,
            discount: new.discount,
            discount_type: new.discount_type,
            total: new.total,
            status: QuoteStatus::Active,
            customer_name: new.customer_name,
            notes: new.notes,
            valid_until: new.valid_until,
            created_at: new.created_at,
        }
    }

    #[test]
    fn test_load_quote_recovers_percentage_discount() {
        let jollof = product(1, "Jollof", 45);
        let mut cart = vat_cart();
        cart.add_line(&jollof);
        cart.add_line(&jollof);
        cart.set_order_discount(OrderDiscount::percentage(Decimal::from(10)))
            .unwrap();
        let now = Utc::now();
        let quote = saved_quote(&cart, now);

        let mut restored = Cart::new(AppliedTax::rate(TaxRate::zero()));
        let n = restored
            .load_quote(&quote, &catalogue(&[jollof]), now)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(restored.discount(), &OrderDiscount::percentage(Decimal::from(10)));
        assert_eq!(restored.tax().name.as_deref(), Some("VAT"));
        assert_eq!(restored.breakdown().total, Money::from_cents(9315));
    }

    #[test]
    fn test_load_quote_with_no_products_left() {
        let mut cart = vat_cart();
        cart.add_line(&product(1, "Jollof", 45));
        let now = Utc::now();
        let quote = saved_quote(&cart, now);

        let mut restored = vat_cart();
        assert!(matches!(
            restored.load_quote(&quote, &HashMap::new(), now),
            Err(CoreError::QuoteUnavailable)
        ));
    }

    #[test]
    fn test_load_expired_quote_rejected() {
        let jollof = product(1, "Jollof", 45);
        let mut cart = vat_cart();
        cart.add_line(&jollof);
        let now = Utc::now();
        let quote = saved_quote(&cart, now);

        let mut restored = vat_cart();
        let later = now + Duration::days(8);
        assert!(matches!(
            restored.load_quote(&quote, &catalogue(&[jollof]), later),
            Err(CoreError::QuoteNotConvertible { .. })
        ));
    }
}
