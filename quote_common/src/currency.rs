//! Currency codes and the fixed-point multiplier policy used to bring quote
//! totals into a common currency.
//!
//! Multipliers are `rust_decimal::Decimal` values; nothing in this module
//! touches binary floating point.

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::error::QuoteError;

/// Currency a quote is priced in.
///
/// Codes the API sends that are not listed are kept verbatim in `Other`, so a
/// record written back carries the code it was read with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, EnumString, Hash, Eq, PartialEq)]
#[serde(from = "String", into = "String")]
#[strum(ascii_case_insensitive)]
pub enum Currency {
    /// Colombian peso, the reporting currency.
    #[default]
    COP,
    /// US dollar.
    USD,
    /// Euro.
    EUR,
    /// Any code the API sends that is not listed above.
    #[strum(disabled)]
    Other(String),
}

impl Currency {
    /// Code as sent to and received from the API.
    pub fn code(&self) -> &str {
        match self {
            Currency::COP => "COP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::Other(code) => code,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        match code.as_str() {
            "COP" => Currency::COP,
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            _ => Currency::Other(code),
        }
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

/// Trait providing line-oriented parsing of multiplier tables.
pub trait RateTableParser: Sized {
    /// Parses a table from a buffered reader.
    ///
    /// Each non-empty line holds a currency code and a decimal multiplier,
    /// separated by whitespace or `=`. Returns an error if any line cannot be parsed.
    fn parse_from_reader<R: BufRead>(reader: R) -> Result<Self, QuoteError>;
}

/// Fixed-point multipliers keyed by currency code.
///
/// Currencies missing from the table convert with a multiplier of one.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTable {
    rates: HashMap<Currency, Decimal>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert(Currency::USD, Decimal::from(4000));
        rates.insert(Currency::EUR, Decimal::from(4500));
        rates.insert(Currency::COP, Decimal::ONE);
        Self { rates }
    }
}

impl CurrencyTable {
    /// Creates an empty table; every currency converts 1:1 until set.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Sets (or replaces) the multiplier for `currency`.
    pub fn with_rate(mut self, currency: Currency, multiplier: Decimal) -> Self {
        self.rates.insert(currency, multiplier);
        self
    }

    /// Multiplier for `currency`, defaulting to one.
    pub fn multiplier(&self, currency: &Currency) -> Decimal {
        self.rates.get(currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Converts `amount` into the common currency.
    ///
    /// Fails with `Overflow` when the product does not fit a `Decimal`.
    pub fn convert(&self, amount: Decimal, currency: &Currency) -> Result<Decimal, QuoteError> {
        amount.checked_mul(self.multiplier(currency)).ok_or_else(|| {
            QuoteError::Overflow(format!("{} {} in common currency", amount, currency))
        })
    }
}

impl RateTableParser for CurrencyTable {
    fn parse_from_reader<R: BufRead>(reader: R) -> Result<Self, QuoteError> {
        let mut table = CurrencyTable::empty();

        for line_result in reader.lines() {
            let line = line_result.map_err(QuoteError::Io)?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() {
                continue;
            }

            let mut parts = trimmed_line
                .split(|c: char| c == '=' || c.is_whitespace())
                .filter(|p| !p.is_empty());
            let (Some(code), Some(value), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(QuoteError::ParseRateTable(format!(
                    "expected `CODE VALUE`, got `{}`",
                    trimmed_line
                )));
            };

            let currency = code
                .parse::<Currency>()
                .map_err(|e| QuoteError::ParseRateTable(format!("{}: {}", code, e)))?;
            let multiplier = value
                .parse::<Decimal>()
                .map_err(|e| QuoteError::ParseRateTable(format!("{}: {}", value, e)))?;
            table.rates.insert(currency, multiplier);
        }
        Ok(table)
    }
}
