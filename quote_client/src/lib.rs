//! Quote admin client library.
//!
//! - `api`: remote API collaborator traits and the HTTP implementation.
//! - `debounce`: debounced remote query controller for search and autocomplete.
//! - `mutation`: optimistic edit/rollback controller.
//! - `notify`: toast notifications.
//! - `failure`: log of failed writes.
//! - `console`: line commands of the console front end.
#![warn(missing_docs)]
pub mod api;
pub mod console;
pub mod debounce;
pub mod failure;
pub mod mutation;
pub mod notify;

pub use debounce::{DebouncePolicy, DebouncedQuery, SharedCollection};
pub use mutation::{EditOutcome, OptimisticMutation};
