//! # Repositories
//!
//! One repository per ledger table. Each holds a pool handle and the change
//! notifier, and is obtained from [`Database`](crate::Database).
//!
//! ## Cross-Entity Effects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  batches.insert / update / delete  ──► products.stock     (one tx)      │
//! │  categories.update (rename)        ──► products.category  (one tx)      │
//! │  products.delete                   ──► variants, batches  (one tx)      │
//! │  tax_rules.set_default             ──► other rules' flag  (one tx)      │
//! │                                                                         │
//! │  Every other write touches exactly one table.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Encoding
//! Money and tax rates are stored as decimal TEXT and parsed back exactly.
//! Lists and maps are stored as JSON TEXT.

pub mod batch;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod quote;
pub mod tax_rule;
pub mod variant;

pub use batch::BatchRepository;
pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use quote::QuoteRepository;
pub use tax_rule::TaxRuleRepository;
pub use variant::VariantRepository;

use std::str::FromStr;

use kaya_core::{DiscountType, Money, TaxRate};
use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Encodes money for a TEXT column.
pub(crate) fn money_text(amount: Money) -> String {
    amount.decimal().to_string()
}

/// Decodes a money TEXT column.
pub(crate) fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    raw.parse::<Money>()
        .map_err(|e| DbError::invalid_data(column, e))
}

pub(crate) fn rate_text(rate: TaxRate) -> String {
    rate.fraction().to_string()
}

pub(crate) fn parse_rate(raw: &str) -> DbResult<TaxRate> {
    let fraction = Decimal::from_str(raw).map_err(|e| DbError::invalid_data("tax_rate", e))?;
    TaxRate::from_fraction(fraction).map_err(|e| DbError::invalid_data("tax_rate", e))
}

pub(crate) fn parse_discount_type(raw: Option<&str>) -> DbResult<Option<DiscountType>> {
    raw.map(|s| {
        DiscountType::parse(s).ok_or_else(|| DbError::invalid_data("discount_type", s))
    })
    .transpose()
}

/// `%term%` for a LIKE clause, with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_text_round_trips_exactly() {
        let amount: Money = "7.2499".parse().unwrap();
        assert_eq!(parse_money("total", &money_text(amount)).unwrap(), amount);
        assert!(parse_money("total", "abc").is_err());
    }

    #[test]
    fn test_parse_rate_rejects_out_of_range() {
        assert!(parse_rate("0.15").is_ok());
        assert!(parse_rate("1.5").is_err());
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
    }
}
