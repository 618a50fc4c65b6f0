//! Derived figures over a list of quotes.
//!
//! All helpers are pure and recomputed on every call. Money is summed with
//! `rust_decimal::Decimal`; formatted results always carry two decimals and
//! round half away from zero. Sums that leave the `Decimal` range fail with
//! `QuoteError::Overflow`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::currency::CurrencyTable;
use crate::error::QuoteError;
use crate::record::{Quote, QuoteItem};

/// Rounds to two decimals and renders with exactly two fractional digits.
pub fn to_fixed2(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Distinct authors in first-seen order.
pub fn authors<'a, I>(quotes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Quote>,
{
    let mut seen: Vec<String> = Vec::new();
    for q in quotes {
        if !seen.iter().any(|a| a == &q.author) {
            seen.push(q.author.clone());
        }
    }
    seen
}

/// Number of quotes written by `author`.
pub fn quotes_by_author<'a, I>(quotes: I, author: &str) -> usize
where
    I: IntoIterator<Item = &'a Quote>,
{
    quotes.into_iter().filter(|q| q.author == author).count()
}

/// Sum of `author`'s quote totals converted through `rates`.
pub fn total_by_author<'a, I>(
    quotes: I,
    author: &str,
    rates: &CurrencyTable,
) -> Result<Decimal, QuoteError>
where
    I: IntoIterator<Item = &'a Quote>,
{
    quotes
        .into_iter()
        .filter(|q| q.author == author)
        .try_fold(Decimal::ZERO, |sum, q| {
            let converted = rates.convert(q.total_price, &q.currency)?;
            sum.checked_add(converted).ok_or_else(|| {
                QuoteError::Overflow(format!("total of {} at quote {}", author, q.id))
            })
        })
}

/// [`total_by_author`] rendered with two decimals.
pub fn total_by_author_fixed<'a, I>(
    quotes: I,
    author: &str,
    rates: &CurrencyTable,
) -> Result<String, QuoteError>
where
    I: IntoIterator<Item = &'a Quote>,
{
    total_by_author(quotes, author, rates).map(to_fixed2)
}

/// Percentage of `author`'s quotes flagged as ordered, with two decimals.
///
/// An author without quotes yields `"0.00"`.
pub fn success_by_author<'a, I>(quotes: I, author: &str) -> String
where
    I: IntoIterator<Item = &'a Quote>,
{
    let (total, ordered) = quotes
        .into_iter()
        .filter(|q| q.author == author)
        .fold((0u64, 0u64), |(t, o), q| (t + 1, o + u64::from(q.order)));
    if total == 0 {
        return to_fixed2(Decimal::ZERO);
    }
    let rate = Decimal::from(ordered) / Decimal::from(total) * Decimal::ONE_HUNDRED;
    to_fixed2(rate)
}

/// Subtotal per category label, in first-seen order.
pub fn category_subtotals(items: &[QuoteItem]) -> Result<Vec<(String, Decimal)>, QuoteError> {
    let mut totals: Vec<(String, Decimal)> = Vec::new();
    for item in items {
        let label = item.category_label();
        let subtotal = item.subtotal()?;
        match totals.iter_mut().find(|(l, _)| *l == label) {
            Some((l, sum)) => {
                *sum = sum
                    .checked_add(subtotal)
                    .ok_or_else(|| QuoteError::Overflow(format!("subtotal of {}", l)))?
            }
            None => totals.push((label, subtotal)),
        }
    }
    Ok(totals)
}

/// Per-author summary row used by the dashboard table.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorSummary {
    /// Author name.
    pub author: String,
    /// Number of quotes.
    pub quotes: usize,
    /// Converted total, two decimals.
    pub total: String,
    /// Success rate in percent, two decimals.
    pub success: String,
}

/// One [`AuthorSummary`] per author, in first-seen order.
pub fn author_summaries(
    quotes: &[Quote],
    rates: &CurrencyTable,
) -> Result<Vec<AuthorSummary>, QuoteError> {
    authors(quotes)
        .into_iter()
        .map(|author| {
            Ok(AuthorSummary {
                quotes: quotes_by_author(quotes, &author),
                total: total_by_author_fixed(quotes, &author, rates)?,
                success: success_by_author(quotes, &author),
                author,
            })
        })
        .collect()
}
