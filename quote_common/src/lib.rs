//!
//! Common types and utilities shared by the quote admin front ends.
//!
//! This crate aggregates:
//! - `error`: unified error type `QuoteError` used across the workspace.
//! - `result`: handy `Result<T, QuoteError>` alias.
//! - `record`: typed quote, client, product and unit records.
//! - `collection`: ordered, id-unique record list.
//! - `currency`: currency codes and the fixed-point multiplier table.
//! - `aggregate`: per-author and per-category figures.
//! - `stats`: monthly dashboard cards.
//! - `format`: money and date display helpers.
//! - `preference`: theme preference store over injected storage.
//! - `net`: API base URL and endpoint paths.
#![warn(missing_docs)]
pub mod aggregate;
pub mod collection;
pub mod currency;
pub mod error;
pub mod format;
pub mod net;
pub mod preference;
pub mod record;
pub mod result;
pub mod stats;

pub use collection::Collection;
pub use error::QuoteError;
pub use record::{Quote, Record, RecordId};
pub use result::Result;
