//! Display helpers for money and dates.

use chrono::{DateTime, Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::aggregate::to_fixed2;
use crate::currency::Currency;

/// Text shown for a missing or unparseable date.
pub const INVALID_DATE: &str = "Fecha no válida";

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Formats `amount` with two decimals using the locale conventions of `currency`.
///
/// USD renders as `$1,234.50`, EUR as `1.234,50 €`, anything else as `$ 1.234,50`.
pub fn format_currency(amount: Decimal, currency: &Currency) -> String {
    let fixed = to_fixed2(amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    match currency {
        Currency::USD => format!("{}${}.{}", sign, group_digits(int_part, ','), frac_part),
        Currency::EUR => format!("{}{},{} €", sign, group_digits(int_part, '.'), frac_part),
        Currency::COP | Currency::Other(_) => {
            format!("{}$ {},{}", sign, group_digits(int_part, '.'), frac_part)
        }
    }
}

/// Formats an API date as a Spanish long date, e.g. `5 de marzo de 2024`.
pub fn format_date(date: Option<&str>) -> String {
    let Some(raw) = date.map(str::trim).filter(|s| !s.is_empty()) else {
        return INVALID_DATE.to_string();
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match parsed {
        Ok(d) => format!("{} de {} de {}", d.day(), MONTHS[d.month0() as usize], d.year()),
        Err(_) => INVALID_DATE.to_string(),
    }
}
