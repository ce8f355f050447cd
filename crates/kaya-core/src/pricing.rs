//! # Pricing Engine
//!
//! Pure functions turning priced lines, a tax rate and an order discount into
//! a price breakdown.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_total(i) = (price_i − unit_discount_i) × quantity_i               │
//! │  subtotal      = Σ line_total(i)                                        │
//! │  tax           = subtotal × rate                                        │
//! │  discount      = flat       → amount                                    │
//! │                  percentage → (subtotal + tax) × amount / 100           │
//! │  total         = max(0, subtotal + tax − discount)                      │
//! │                                                                         │
//! │  Example: 45 × 2, rate 0.15, 10%                                        │
//! │    subtotal 90 → tax 13.5 → discount 10.35 → total 93.15                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Refunds and cancellations are not priced independently: the sale's
//! breakdown is computed as usual and then [`PriceBreakdown::mirrored`]
//! flips every component.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::PaymentSplit;
use crate::types::TaxRate;

/// Maximum difference tolerated between split payments and the order total.
pub const PAYMENT_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

// =============================================================================
// Order Discount
// =============================================================================

/// How an order-level discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Flat,
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Flat => "flat",
            DiscountType::Percentage => "percentage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flat" => Some(DiscountType::Flat),
            "percentage" => Some(DiscountType::Percentage),
            _ => None,
        }
    }
}

/// An order-level discount as entered at the till.
///
/// `amount` is currency for [`DiscountType::Flat`] and a percentage
/// (0 to 100) for [`DiscountType::Percentage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderDiscount {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type", default)]
    pub kind: DiscountType,
}

impl OrderDiscount {
    /// No discount.
    pub const fn none() -> Self {
        OrderDiscount {
            amount: Decimal::ZERO,
            kind: DiscountType::Flat,
        }
    }

    pub fn flat(amount: Money) -> Self {
        OrderDiscount {
            amount: amount.decimal(),
            kind: DiscountType::Flat,
        }
    }

    pub fn percentage(percent: Decimal) -> Self {
        OrderDiscount {
            amount: percent,
            kind: DiscountType::Percentage,
        }
    }

    pub fn is_none(&self) -> bool {
        self.amount.is_zero()
    }

    /// Resolves to an absolute amount against `gross` (subtotal + tax).
    pub fn resolve(&self, gross: Money) -> Money {
        match self.kind {
            DiscountType::Flat => Money::from_decimal(self.amount),
            DiscountType::Percentage => gross.percent(self.amount),
        }
    }
}

// =============================================================================
// Priced Lines
// =============================================================================

/// Anything that can be priced as a line: cart lines, order items.
pub trait PriceLine {
    fn unit_price(&self) -> Money;

    /// Signed quantity.
    fn quantity(&self) -> i64;

    /// Flat discount per unit.
    fn unit_discount(&self) -> Money;

    /// `(price − discount) × quantity`.
    fn line_total(&self) -> Money {
        (self.unit_price() - self.unit_discount()) * self.quantity()
    }
}

/// A bare priced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub price: Money,
    pub quantity: i64,
    pub discount: Money,
}

impl PricedLine {
    pub fn new(price: Money, quantity: i64, discount: Money) -> Self {
        PricedLine {
            price,
            quantity,
            discount,
        }
    }
}

impl PriceLine for PricedLine {
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
// Price Breakdown
// =============================================================================

/// Result of pricing a set of lines. Values are unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    /// Resolved absolute discount.
    pub discount: Money,
    pub total: Money,
}

impl PriceBreakdown {
    /// Sign-flips every component (refund and cancellation records).
    pub fn mirrored(&self) -> Self {
        PriceBreakdown {
            subtotal: -self.subtotal,
            tax: -self.tax,
            discount: -self.discount,
            total: -self.total,
        }
    }
}

/// Prices `lines` under `rate` and `discount`.
///
/// ```rust
/// use kaya_core::money::Money;
/// use kaya_core::pricing::{price_lines, OrderDiscount, PricedLine};
/// use kaya_core::types::TaxRate;
/// use rust_decimal::Decimal;
///
/// let lines = [PricedLine::new(Money::from_major(45), 2, Money::ZERO)];
/// let rate = TaxRate::from_percent(15).unwrap();
///
/// let b = price_lines(&lines, rate, &OrderDiscount::percentage(Decimal::from(10)));
/// assert_eq!(b.discount.to_string(), "10.35");
/// assert_eq!(b.total.to_string(), "93.15");
/// ```
pub fn price_lines<L: PriceLine>(
    lines: &[L],
    rate: TaxRate,
    discount: &OrderDiscount,
) -> PriceBreakdown {
    let subtotal: Money = lines.iter().map(PriceLine::line_total).sum();
    let tax = rate.apply(subtotal);
    let discount = discount.resolve(subtotal + tax);
    let total = (subtotal + tax - discount).floor_zero();

    PriceBreakdown {
        subtotal,
        tax,
        discount,
        total,
    }
}

/// Recovers the entered discount from a stored absolute amount.
///
/// Percentage discounts are inverted against the stored subtotal and rate:
/// `discount / (subtotal × (1 + rate)) × 100`. A zero gross is treated as 1
/// so the division is always defined.
pub fn invert_discount(
    discount: Money,
    kind: DiscountType,
    subtotal: Money,
    rate: TaxRate,
) -> OrderDiscount {
    match kind {
        DiscountType::Flat => OrderDiscount::flat(discount),
        DiscountType::Percentage => {
            let gross = (subtotal + rate.apply(subtotal)).decimal();
            let gross = if gross.is_zero() { Decimal::ONE } else { gross };
            let percent = discount.decimal() / gross * Decimal::ONE_HUNDRED;
            OrderDiscount::percentage(percent.normalize())
        }
    }
}

/// True if the split payments add up to `total` within [`PAYMENT_TOLERANCE`].
pub fn payments_match(splits: &[PaymentSplit], total: Money) -> bool {
    let paid: Money = splits.iter().map(PaymentSplit::amount).sum();
    paid.approx_eq(total, PAYMENT_TOLERANCE)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PaymentMethod;

    fn vat() -> TaxRate {
        TaxRate::from_percent(15).unwrap()
    }

    fn jollof_x2() -> Vec<PricedLine> {
        vec![PricedLine::new(Money::from_major(45), 2, Money::ZERO)]
    }

    #[test]
    fn test_no_discount_scenario() {
        let b = price_lines(&jollof_x2(), vat(), &OrderDiscount::none());
        assert_eq!(b.subtotal, Money::from_major(90));
        assert_eq!(b.tax, Money::from_cents(1350));
        assert_eq!(b.discount, Money::ZERO);
        assert_eq!(b.total, Money::from_cents(10350));
    }

    #[test]
    fn test_percentage_discount_scenario() {
        let b = price_lines(
            &jollof_x2(),
            vat(),
            &OrderDiscount::percentage(Decimal::from(10)),
        );
        assert_eq!(b.discount, Money::from_cents(1035));
        assert_eq!(b.total, Money::from_cents(9315));
    }

    #[test]
    fn test_flat_discount_is_taken_as_is() {
        let b = price_lines(&jollof_x2(), vat(), &OrderDiscount::flat(Money::from_major(5)));
        assert_eq!(b.discount, Money::from_major(5));
        assert_eq!(b.total, Money::from_cents(9850));
    }

    #[test]
    fn test_line_discount_applies_per_unit() {
        let lines = [
            PricedLine::new(Money::from_major(45), 2, Money::from_major(5)),
            PricedLine::new(Money::from_major(10), 3, Money::ZERO),
        ];
        let b = price_lines(&lines, TaxRate::zero(), &OrderDiscount::none());
        assert_eq!(b.subtotal, Money::from_major(110));
        assert_eq!(b.tax, Money::ZERO);
    }

    #[test]
    fn test_total_floors_at_zero() {
        let b = price_lines(&jollof_x2(), vat(), &OrderDiscount::flat(Money::from_major(500)));
        assert_eq!(b.total, Money::ZERO);
        assert_eq!(b.discount, Money::from_major(500));

        let b = price_lines(
            &jollof_x2(),
            vat(),
            &OrderDiscount::percentage(Decimal::ONE_HUNDRED),
        );
        assert_eq!(b.total, Money::ZERO);
    }

    #[test]
    fn test_negative_quantities_propagate_sign() {
        let lines = [PricedLine::new(Money::from_major(45), -2, Money::ZERO)];
        let b = price_lines(&lines, vat(), &OrderDiscount::none());
        assert_eq!(b.subtotal, Money::from_major(-90));
        assert_eq!(b.tax, Money::from_cents(-1350));
    }

    #[test]
    fn test_mirrored_flips_every_component() {
        let sale = price_lines(
            &jollof_x2(),
            vat(),
            &OrderDiscount::percentage(Decimal::from(10)),
        );
        let refund = sale.mirrored();
        assert_eq!(refund.subtotal, -sale.subtotal);
        assert_eq!(refund.tax, -sale.tax);
        assert_eq!(refund.discount, -sale.discount);
        assert_eq!(refund.total, Money::from_cents(-9315));
    }

    #[test]
    fn test_invert_percentage_discount() {
        let entered = OrderDiscount::percentage(Decimal::from(10));
        let b = price_lines(&jollof_x2(), vat(), &entered);

        let recovered = invert_discount(b.discount, DiscountType::Percentage, b.subtotal, vat());
        assert_eq!(recovered, entered);
    }

    #[test]
    fn test_invert_with_zero_subtotal_does_not_divide_by_zero() {
        let recovered = invert_discount(
            Money::from_major(2),
            DiscountType::Percentage,
            Money::ZERO,
            vat(),
        );
        assert_eq!(recovered.amount, Decimal::from(200));
    }

    #[test]
    fn test_payments_match_within_tolerance() {
        let total = Money::from_cents(10350);
        let splits = [
            PaymentSplit::new(PaymentMethod::Cash, Money::from_major(50)),
            PaymentSplit::new(PaymentMethod::Momo, Money::from_cents(5350)),
        ];
        assert!(payments_match(&splits, total));

        let short = [PaymentSplit::new(PaymentMethod::Cash, Money::from_major(100))];
        assert!(!payments_match(&short, total));
    }

    #[test]
    fn test_discount_wire_shape() {
        let d: OrderDiscount = serde_json::from_str(r#"{"amount":10,"type":"percentage"}"#).unwrap();
        assert_eq!(d, OrderDiscount::percentage(Decimal::from(10)));
    }
}
