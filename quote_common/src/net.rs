//! Remote API location and endpoint helpers.

use crate::record::RecordId;

/// Default base URL of the quote API.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Quote list/search/create path.
pub const QUOTES_PATH: &str = "/quote";
/// Client autocomplete path.
pub const CLIENTS_PATH: &str = "/client";
/// Product autocomplete path.
pub const PRODUCTS_PATH: &str = "/product";
/// Unit autocomplete path.
pub const UNITS_PATH: &str = "/unit";
/// Query parameter carrying the search text.
pub const SEARCH_PARAM: &str = "search";

/// Joins `base` and `path` without doubling the slash.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// URL of a single quote, used for PATCH.
pub fn quote_url(base: &str, id: RecordId) -> String {
    format!("{}/{}", endpoint(base, QUOTES_PATH), id)
}
