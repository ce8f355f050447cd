//! # Domain Types
//!
//! Catalogue entities of the local ledger.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalogue Types                                 │
//! │                                                                         │
//! │  ┌──────────────┐  name   ┌──────────────┐                              │
//! │  │   Category   │◄────────│   Product    │──────┐                       │
//! │  │  name (key)  │ (denorm)│  stock       │      │ 1..n                  │
//! │  └──────────────┘         │  threshold   │      ▼                       │
//! │                           └──────┬───────┘ ┌──────────────┐             │
//! │                                  │ 1..n    │ProductVariant│             │
//! │                                  ▼         │ own price /  │             │
//! │                           ┌──────────────┐ │ own stock    │             │
//! │                           │    Batch     │ └──────────────┘             │
//! │                           │  remaining → │                              │
//! │                           │  adjusts     │                              │
//! │                           │  Product.    │                              │
//! │                           │  stock       │                              │
//! │                           └──────────────┘                              │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐                                     │
//! │  │   TaxRule    │  │   Customer   │                                     │
//! │  │ rate 0.0-1.0 │  │  balance     │                                     │
//! │  └──────────────┘  └──────────────┘                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity carries a device-local integer id assigned by the ledger.
//! The same id is the `clientId` used to deduplicate records on the sync
//! server, so it is never reassigned.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

/// Device-local primary key. Doubles as the sync `clientId`.
pub type LocalId = i64;

// =============================================================================
// Tax Rate
// =============================================================================

/// A tax rate as a fraction in `[0, 1]` (0.15 = 15%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl TaxRate {
    /// Creates a rate from a fraction, rejecting values outside `[0, 1]`.
    pub fn from_fraction(fraction: Decimal) -> ValidationResult<Self> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(ValidationError::OutOfRange {
                field: "tax rate".to_string(),
                min: 0,
                max: 1,
            });
        }
        Ok(TaxRate(fraction))
    }

    /// Creates a rate from a percentage (15 → 0.15).
    pub fn from_percent(percent: impl Into<Decimal>) -> ValidationResult<Self> {
        let percent = percent.into();
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "tax rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate(percent / Decimal::ONE_HUNDRED))
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Returns the fraction (0.15).
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the percentage (15), for display.
    #[inline]
    pub fn percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    /// Checks if the rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Tax owed on `amount` (`amount × rate`, unrounded).
    #[inline]
    pub fn apply(&self, amount: Money) -> Money {
        amount.scale(self.0)
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category. The name is the join key used by products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: LocalId,
    pub name: String,
    pub description: Option<String>,
    /// Display colour, `#rrggbb`.
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// How a product names its category when saved.
///
/// Either an existing category by id, or a new category by name that is
/// created on save (or reused if a category with that name already exists).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryRef {
    Existing { id: LocalId },
    New { name: String },
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: LocalId,
    pub name: String,
    pub price: Money,

    /// Category name (denormalized; kept in step by category rename).
    pub category: String,
    pub category_id: Option<LocalId>,

    /// Authoritative on-hand count. Never below zero at rest.
    pub stock: i64,
    pub low_stock_threshold: i64,

    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True if the product is active and at or under its threshold.
    pub fn is_low_stock(&self) -> bool {
        self.is_active && self.stock <= self.low_stock_threshold
    }
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_true() -> bool {
    true
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category: CategoryRef,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewProduct {
    /// A minimal active product with default stock settings.
    pub fn new(name: impl Into<String>, price: Money, category: CategoryRef) -> Self {
        NewProduct {
            name: name.into(),
            price,
            category,
            stock: 0,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            barcode: None,
            sku: None,
            image: None,
            description: None,
            is_active: true,
        }
    }
}

/// Partial product update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// =============================================================================
// Product Variant
// =============================================================================

/// A variant of a product (size, flavour...). Its stock is its own and does
/// not feed into the parent product's stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: LocalId,
    pub product_id: LocalId,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Money,
    pub stock: i64,
    /// Free-form attributes, e.g. `size → L`.
    pub attributes: BTreeMap<String, String>,
}

/// Input for creating or replacing a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVariant {
    pub product_id: LocalId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

// =============================================================================
// Batch
// =============================================================================

/// A received lot of stock for a product (optionally a variant).
///
/// ## Stock Coupling
/// ```text
/// create   remaining R        → product.stock += quantity
/// edit     R1 → R2            → product.stock  = max(0, stock + R2 − R1)
/// delete   remaining R > 0    → product.stock  = max(0, stock − R)
/// ```
/// No invariant ties `Σ batch.remaining_quantity` to `product.stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: LocalId,
    pub product_id: LocalId,
    pub variant_id: Option<LocalId>,
    pub batch_number: String,
    /// Quantity originally received.
    pub quantity: i64,
    /// Quantity left; never above `quantity`.
    pub remaining_quantity: i64,
    pub cost_price: Money,
    pub expiry_date: Option<DateTime<Utc>>,
    pub manufacturing_date: Option<DateTime<Utc>>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for receiving a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    pub product_id: LocalId,
    #[serde(default)]
    pub variant_id: Option<LocalId>,
    pub batch_number: String,
    pub quantity: i64,
    /// Defaults to `quantity`.
    #[serde(default)]
    pub remaining_quantity: Option<i64>,
    pub cost_price: Money,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub manufacturing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBatch {
    /// Remaining quantity after applying the default.
    pub fn effective_remaining(&self) -> i64 {
        self.remaining_quantity.unwrap_or(self.quantity)
    }
}

/// Partial batch update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchUpdate {
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub remaining_quantity: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub manufacturing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Tax Rule
// =============================================================================

/// A named tax rate. At most one rule is the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    pub id: LocalId,
    pub name: String,
    pub rate: TaxRate,
    pub is_default: bool,
    pub is_active: bool,
}

/// Input for creating or replacing a tax rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaxRule {
    pub name: String,
    pub rate: TaxRate,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a running account balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: LocalId,
    pub name: String,
    pub phone: String,
    pub balance: Money,
}

/// Input for creating or replacing a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub balance: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percent() {
        let rate = TaxRate::from_percent(15).unwrap();
        assert_eq!(rate.fraction(), Decimal::new(15, 2));
        assert_eq!(rate.percent(), Decimal::from(15));

        assert!(TaxRate::from_percent(101).is_err());
        assert!(TaxRate::from_percent(-1).is_err());
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert!(TaxRate::from_fraction(Decimal::ONE).is_ok());
        assert!(TaxRate::from_fraction(Decimal::new(101, 2)).is_err());
    }

    #[test]
    fn test_tax_apply() {
        let rate = TaxRate::from_percent(15).unwrap();
        assert_eq!(rate.apply(Money::from_major(90)), Money::from_cents(1350));
        assert_eq!(TaxRate::zero().apply(Money::from_major(90)), Money::ZERO);
    }

    #[test]
    fn test_category_ref_serde_shape() {
        let json = serde_json::to_value(CategoryRef::New { name: "Snacks".into() }).unwrap();
        assert_eq!(json["kind"], "new");
        assert_eq!(json["name"], "Snacks");

        let back: CategoryRef = serde_json::from_str(r#"{"kind":"existing","id":4}"#).unwrap();
        assert_eq!(back, CategoryRef::Existing { id: 4 });
    }

    #[test]
    fn test_new_batch_remaining_defaults_to_quantity() {
        let batch = NewBatch {
            product_id: 1,
            variant_id: None,
            batch_number: "B-1".into(),
            quantity: 24,
            remaining_quantity: None,
            cost_price: Money::from_major(3),
            expiry_date: None,
            manufacturing_date: None,
            supplier: None,
            notes: None,
        };
        assert_eq!(batch.effective_remaining(), 24);
    }
}
