//! # Validation Module
//!
//! Input validation for Kaya POS commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command (Rust)                                                │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── THIS MODULE: business rule validation                              │
//! │           │                                                             │
//! │           ▼  (rejected input never reaches the ledger)                  │
//! │  Layer 2: Ledger (SQLite)                                               │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE (category name)                                             │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kaya_core::money::Money;
//! use kaya_core::validation::{validate_price, validate_product_name};
//!
//! validate_product_name("Waakye Special").unwrap();
//! validate_price(Money::from_major(35)).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{DiscountType, OrderDiscount};
use crate::types::{NewBatch, NewCustomer};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product, category or customer name.
pub const MAX_NAME_LEN: usize = 200;

/// Largest unit price, line discount or flat order discount, in major units.
pub const MAX_PRICE: i64 = 1_000_000_000;

/// Largest quantity on a single cart line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Longest accepted quote validity.
pub const MAX_QUOTE_VALID_DAYS: i64 = 365;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use kaya_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Banku & Tilapia").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a category name. Same rules as product names.
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("category", name)
}

/// Validates a tax rule name.
pub fn validate_tax_rule_name(name: &str) -> ValidationResult<()> {
    validate_name("tax rule", name)
}

/// Validates a search query and returns it trimmed.
///
/// Empty is allowed (returns everything).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a `#rrggbb` display colour.
pub fn validate_color(color: &str) -> ValidationResult<()> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            reason: "expected #rrggbb".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn non_negative_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn bounded_money(field: &str, amount: Money) -> ValidationResult<()> {
    non_negative_money(field, amount)?;
    if amount > Money::from_major(MAX_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }
    Ok(())
}

fn non_negative_count(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price. Zero is allowed (free items); anything above
/// [`MAX_PRICE`] is rejected.
///
/// ```rust
/// use kaya_core::money::Money;
/// use kaya_core::validation::validate_price;
///
/// assert!(validate_price(Money::ZERO).is_ok());
/// assert!(validate_price(Money::from_major(-1)).is_err());
/// assert!(validate_price(Money::from_major(10_000_000_000)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    bounded_money("price", price)
}

/// Validates an on-hand stock count.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    non_negative_count("stock", stock)
}

/// Validates a low-stock threshold.
pub fn validate_threshold(threshold: i64) -> ValidationResult<()> {
    non_negative_count("low stock threshold", threshold)
}

/// Validates a per-unit line discount.
pub fn validate_line_discount(discount: Money) -> ValidationResult<()> {
    bounded_money("discount", discount)
}

/// Validates an order-level discount.
///
/// ## Rules
/// - Amount must not be negative
/// - A percentage above 100 is rejected (not clamped)
/// - A flat amount above [`MAX_PRICE`] is rejected
pub fn validate_order_discount(discount: &OrderDiscount) -> ValidationResult<()> {
    if discount.amount < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }

    if discount.kind == DiscountType::Percentage && discount.amount > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: 0,
            max: 100,
        });
    }

    if discount.kind == DiscountType::Flat && discount.amount > Decimal::from(MAX_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates a tax percentage (0 to 100).
pub fn validate_tax_percent(percent: Decimal) -> ValidationResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates how many days a quote stays valid.
pub fn validate_valid_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_QUOTE_VALID_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "valid days".to_string(),
            min: 1,
            max: MAX_QUOTE_VALID_DAYS,
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a batch before it is received.
///
/// ## Rules
/// - Batch number is required
/// - Quantity must be positive
/// - Cost price must not be negative
/// - Remaining quantity (if given) is within `0..=quantity`
pub fn validate_batch(batch: &NewBatch) -> ValidationResult<()> {
    if batch.batch_number.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "batch number".to_string(),
        });
    }

    if batch.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    non_negative_money("cost price", batch.cost_price)?;
    validate_remaining(batch.effective_remaining(), batch.quantity)
}

/// Validates a remaining quantity against the received quantity.
pub fn validate_remaining(remaining: i64, quantity: i64) -> ValidationResult<()> {
    if remaining < 0 || remaining > quantity {
        return Err(ValidationError::OutOfRange {
            field: "remaining quantity".to_string(),
            min: 0,
            max: quantity,
        });
    }
    Ok(())
}

/// Validates a customer record. Name and phone are required.
pub fn validate_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_name("customer name", &customer.name)?;

    if customer.phone.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Sobolo (500ml)").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#f97316").is_ok());
        assert!(validate_color("#3B82F6").is_ok());
        assert!(validate_color("f97316").is_err());
        assert!(validate_color("#f9731").is_err());
        assert!(validate_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::ZERO).is_ok());
        assert!(validate_price(Money::from_cents(1099)).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
        assert!(validate_price(Money::from_major(MAX_PRICE)).is_ok());
        assert!(matches!(
            validate_price(Money::from_major(MAX_PRICE + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_line_discount(Money::from_major(MAX_PRICE + 1)).is_err());
    }

    #[test]
    fn test_percentage_discount_over_100_rejected() {
        let ok = OrderDiscount::percentage(Decimal::ONE_HUNDRED);
        assert!(validate_order_discount(&ok).is_ok());

        let too_much = OrderDiscount::percentage(Decimal::from(101));
        assert!(matches!(
            validate_order_discount(&too_much),
            Err(ValidationError::OutOfRange { .. })
        ));

        // A flat discount may exceed 100
        let flat = OrderDiscount::flat(Money::from_major(500));
        assert!(validate_order_discount(&flat).is_ok());

        let huge = OrderDiscount::flat(Money::from_major(MAX_PRICE + 1));
        assert!(validate_order_discount(&huge).is_err());

        let negative = OrderDiscount::flat(Money::from_major(-1));
        assert!(validate_order_discount(&negative).is_err());
    }

    #[test]
    fn test_validate_valid_days() {
        assert!(validate_valid_days(7).is_ok());
        assert!(validate_valid_days(0).is_err());
        assert!(validate_valid_days(366).is_err());
    }

    #[test]
    fn test_validate_batch() {
        let mut batch = NewBatch {
            product_id: 1,
            variant_id: None,
            batch_number: "B-001".into(),
            quantity: 10,
            remaining_quantity: None,
            cost_price: Money::from_major(2),
            expiry_date: None,
            manufacturing_date: None,
            supplier: None,
            notes: None,
        };
        assert!(validate_batch(&batch).is_ok());

        batch.remaining_quantity = Some(11);
        assert!(validate_batch(&batch).is_err());

        batch.remaining_quantity = None;
        batch.quantity = 0;
        assert!(validate_batch(&batch).is_err());

        batch.quantity = 10;
        batch.batch_number = " ".into();
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn test_validate_customer() {
        let customer = NewCustomer {
            name: "Ama".into(),
            phone: "0244000000".into(),
            balance: Money::ZERO,
        };
        assert!(validate_customer(&customer).is_ok());

        let no_phone = NewCustomer {
            phone: "".into(),
            ..customer
        };
        assert!(validate_customer(&no_phone).is_err());
    }
}
