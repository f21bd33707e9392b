//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`KHATA_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no mutex is needed.

use khata_core::Money;
use num_format::Locale;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Shop name (statement and invoice headers)
    pub shop_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// num-format locale name used for digit grouping, e.g. "en"
    pub number_locale: String,
}

impl Default for ConfigState {
    /// ## Default Values
    /// - Shop: "Khata Ledger"
    /// - Currency: Rs
    /// - Grouping: `en` (34,000)
    fn default() -> Self {
        ConfigState {
            shop_name: "Khata Ledger".to_string(),
            currency_symbol: "Rs".to_string(),
            number_locale: "en".to_string(),
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `KHATA_SHOP_NAME`: Override shop name
    /// - `KHATA_CURRENCY_SYMBOL`: Override currency symbol
    /// - `KHATA_NUMBER_LOCALE`: Grouping locale; unknown names are ignored
    pub fn from_env() -> Self {
        let mut config = ConfigState::default();

        if let Ok(shop_name) = std::env::var("KHATA_SHOP_NAME") {
            config.shop_name = shop_name;
        }

        if let Ok(symbol) = std::env::var("KHATA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Ok(name) = std::env::var("KHATA_NUMBER_LOCALE") {
            match Locale::from_name(&name) {
                Ok(_) => config.number_locale = name,
                Err(_) => warn!(locale = %name, "Unknown number locale, keeping default"),
            }
        }

        config
    }

    /// The grouping locale, falling back to `en`.
    pub fn locale(&self) -> Locale {
        Locale::from_name(&self.number_locale).unwrap_or(Locale::en)
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_major(34_000)), "Rs 34,000");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let locale = self.locale();
        if amount.is_negative() {
            let owed = Money::zero() - amount;
            format!("-{} {}", self.currency_symbol, owed.format_grouped(&locale))
        } else {
            format!("{} {}", self.currency_symbol, amount.format_grouped(&locale))
        }
    }
}
