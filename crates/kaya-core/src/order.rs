//! # Orders & Quotes
//!
//! Persisted pricing snapshots: orders (sales, refunds, cancellations,
//! drafts) and quotes.
//!
//! ## Lifecycles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER (append-only)                                                    │
//! │                                                                         │
//! │  cart ──checkout(sale)──────────► completed ──┐                         │
//! │  cart ──checkout(refund)────────► refunded    ├─ synced: false → true   │
//! │  cart ──checkout(cancellation)──► cancelled ──┘   (only field ever      │
//! │  cart ──save_draft──────────────► draft            mutated)             │
//! │                                     │                                   │
//! │                                     └─ load_draft: re-hydrate cart,     │
//! │                                        then DELETE (one-shot)           │
//! │                                                                         │
//! │  QUOTE (durable)                                                        │
//! │                                                                         │
//! │  cart ──save_quote──► active ──convert──► converted (kept)              │
//! │                         │                                               │
//! │                         └── now > valid_until ──► expired (derived)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{DiscountType, PriceLine};
use crate::types::{LocalId, TaxRate};

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Completed,
    Pending,
    Cancelled,
    Refunded,
    /// Saved-for-later cart. Local only, never synced.
    Draft,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "completed",
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(OrderStatus::Completed),
            "pending" => Ok(OrderStatus::Pending),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            "draft" => Ok(OrderStatus::Draft),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["completed", "pending", "cancelled", "refunded", "draft"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Checkout Kind
// =============================================================================

/// What a checkout records.
///
/// Refunds and cancellations are new records priced as the mirror image of
/// the sale (multiplier −1), never edits of the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutKind {
    #[default]
    Sale,
    Refund,
    Cancellation,
}

impl CheckoutKind {
    /// Status of the resulting order.
    pub fn status(&self) -> OrderStatus {
        match self {
            CheckoutKind::Sale => OrderStatus::Completed,
            CheckoutKind::Refund => OrderStatus::Refunded,
            CheckoutKind::Cancellation => OrderStatus::Cancelled,
        }
    }

    /// Sign applied to quantities and amounts.
    pub fn multiplier(&self) -> i64 {
        match self {
            CheckoutKind::Sale => 1,
            CheckoutKind::Refund | CheckoutKind::Cancellation => -1,
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Payment method label. Payments are recorded, not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    /// Mobile money.
    Momo,
    Card,
    /// On the customer's account.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
        }
    }
}

/// One leg of a (possibly split) payment.
///
/// Serialized as `{"method": "cash", "amount": 50}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentSplit {
    Cash { amount: Money },
    Momo { amount: Money },
    Card { amount: Money },
    Credit { amount: Money },
}

impl PaymentSplit {
    /// Builds a split for `method`.
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        match method {
            PaymentMethod::Cash => PaymentSplit::Cash { amount },
            PaymentMethod::Momo => PaymentSplit::Momo { amount },
            PaymentMethod::Card => PaymentSplit::Card { amount },
            PaymentMethod::Credit => PaymentSplit::Credit { amount },
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentSplit::Cash { .. } => PaymentMethod::Cash,
            PaymentSplit::Momo { .. } => PaymentMethod::Momo,
            PaymentSplit::Card { .. } => PaymentMethod::Card,
            PaymentSplit::Credit { .. } => PaymentMethod::Credit,
        }
    }

    pub fn amount(&self) -> Money {
        match *self {
            PaymentSplit::Cash { amount }
            | PaymentSplit::Momo { amount }
            | PaymentSplit::Card { amount }
            | PaymentSplit::Credit { amount } => amount,
        }
    }

    /// Same method, sign-flipped amount.
    pub fn mirrored(&self) -> Self {
        PaymentSplit::new(self.method(), -self.amount())
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A priced line of an order or quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: LocalId,
    pub name: String,
    /// Unit price at the time of sale.
    pub price: Money,
    /// Signed: negative for refund/return lines.
    pub quantity: i64,
    /// Flat discount per unit.
    #[serde(default)]
    pub discount: Money,
}

impl PriceLine for OrderItem {
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
// Order
// =============================================================================

/// An order as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: LocalId,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub tax_rule_name: Option<String>,
    pub tax_rate: Option<TaxRate>,
    /// Absolute discount, already resolved from flat/percentage.
    pub discount: Money,
    pub discount_type: Option<DiscountType>,
    pub total: Money,
    pub status: OrderStatus,
    pub payments: Vec<PaymentSplit>,
    pub customer_id: Option<LocalId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl Order {
    /// Sum of all payment legs.
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(PaymentSplit::amount).sum()
    }

    /// True if the order takes part in sync (everything but drafts).
    pub fn is_syncable(&self) -> bool {
        self.status != OrderStatus::Draft
    }
}

/// An order ready to be written. The ledger assigns `id`; `synced` starts
/// false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub tax_rule_name: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub discount: Money,
    pub discount_type: Option<DiscountType>,
    pub total: Money,
    pub status: OrderStatus,
    pub payments: Vec<PaymentSplit>,
    pub customer_id: Option<LocalId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quote
// =============================================================================

/// The stored status of a quote. `Expired` is normally derived, see
/// [`Quote::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Active,
    Converted,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Active => "active",
            QuoteStatus::Converted => "converted",
            QuoteStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer-facing price estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: LocalId,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub tax_rule_name: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub discount: Money,
    pub discount_type: Option<DiscountType>,
    pub total: Money,
    pub status: QuoteStatus,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Status as seen at `now`: an active quote past its validity is expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> QuoteStatus {
        match self.status {
            QuoteStatus::Active if self.valid_until < now => QuoteStatus::Expired,
            other => other,
        }
    }

    /// Only active, unexpired quotes convert into a cart.
    pub fn is_convertible(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == QuoteStatus::Active
    }
}

/// A quote ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuote {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub tax_rule_name: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub discount: Money,
    pub discount_type: Option<DiscountType>,
    pub total: Money,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
