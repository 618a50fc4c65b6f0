//! Error types shared by the quote library and its front ends.
//!
//! The `QuoteError` enum unifies I/O, serialization, arithmetic and locking
//! failures with the domain failures raised by the controllers (`NotFound`,
//! `RemoteRead`, `RemoteWrite`), so every crate propagates a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::record::RecordId;

/// Unified error type shared by the library and the client.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// I/O error originating from the standard library (preference file, rate table).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Error while parsing a currency multiplier table.
    #[error("Parse rate table error: {0}")]
    ParseRateTable(String),

    /// A money amount could not be parsed as a fixed-point decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] rust_decimal::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A money computation exceeded the range of a `Decimal`.
    #[error("Amount out of range: {0}")]
    Overflow(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// A mutation targeted a record that is not in the collection.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// A record with the same identifier is already present.
    #[error("Duplicate record id: {0}")]
    Duplicate(RecordId),

    /// A list/search request against the remote API failed.
    #[error("Remote read failed: {0}")]
    RemoteRead(String),

    /// A create/patch request against the remote API failed.
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// The HTTP transport could not complete the request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote API answered with a non-2xx status.
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

impl<T> From<PoisonError<T>> for QuoteError {
    fn from(err: PoisonError<T>) -> Self {
        QuoteError::MutexLock(err.to_string())
    }
}
