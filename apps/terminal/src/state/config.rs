//! # Configuration State
//!
//! Store-level settings read once at startup.
//!
//! ## Environment Variables
//! | Variable                | Default      |
//! |-------------------------|--------------|
//! | `KAYA_STORE_NAME`       | Kaya POS     |
//! | `KAYA_CURRENCY_SYMBOL`  | ₵            |
//! | `KAYA_TAX_RATE`         | 0.15         |
//! | `KAYA_QUOTE_VALID_DAYS` | 7            |
//! | `KAYA_DB_PATH`          | app data dir |

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use kaya_core::validation::validate_valid_days;
use kaya_core::{Money, TaxRate, DEFAULT_TAX_PERCENT};

/// Default quote validity in days.
pub const DEFAULT_QUOTE_VALID_DAYS: i64 = 7;

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (shown on receipts)
    pub store_name: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Rate applied when no tax rule is marked default
    pub default_tax_rate: TaxRate,

    /// Validity of a new quote when none is given
    pub quote_valid_days: i64,

    /// Ledger file override. `None` uses the platform data directory.
    #[serde(skip)]
    pub db_path: Option<PathBuf>,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Kaya POS".to_string(),
            currency_code: "GHS".to_string(),
            currency_symbol: "₵".to_string(),
            default_tax_rate: TaxRate::from_percent(DEFAULT_TAX_PERCENT)
                .unwrap_or_else(|_| TaxRate::zero()),
            quote_valid_days: DEFAULT_QUOTE_VALID_DAYS,
            db_path: None,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values are
    /// logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(name) = lookup("KAYA_STORE_NAME") {
            config.store_name = name;
        }

        if let Some(symbol) = lookup("KAYA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("KAYA_TAX_RATE") {
            match Decimal::from_str(raw.trim()).map(TaxRate::from_fraction) {
                Ok(Ok(rate)) => config.default_tax_rate = rate,
                _ => warn!(value = %raw, "Ignoring invalid KAYA_TAX_RATE"),
            }
        }

        if let Some(raw) = lookup("KAYA_QUOTE_VALID_DAYS") {
            match raw.trim().parse::<i64>() {
                Ok(days) if validate_valid_days(days).is_ok() => config.quote_valid_days = days,
                _ => warn!(value = %raw, "Ignoring invalid KAYA_QUOTE_VALID_DAYS"),
            }
        }

        if let Some(path) = lookup("KAYA_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Formats an amount with the currency symbol, to 2 decimal places.
    ///
    /// ```rust
    /// use kaya_core::Money;
    /// use kaya_terminal::state::ConfigState;
    ///
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(10350)), "₵103.50");
    /// assert_eq!(config.format_currency(Money::from_cents(-250)), "-₵2.50");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, amount.abs())
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }
}
