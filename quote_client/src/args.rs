//! Command-line arguments for the quote console.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use quote_common::net::DEFAULT_API_URL;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base URL of the quote API.
    #[clap(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Quiet period of the quote search box, in milliseconds.
    #[clap(long, default_value_t = 1500)]
    pub search_delay_ms: u64,

    /// Quiet period of the autocomplete fields, in milliseconds.
    #[clap(long, default_value_t = 1000)]
    pub suggest_delay_ms: u64,

    /// Minimum search length before a request is scheduled.
    #[clap(long, default_value_t = 1)]
    pub min_search_len: usize,

    /// Minimum autocomplete length before a request is scheduled.
    #[clap(long, default_value_t = 2)]
    pub min_suggest_len: usize,

    /// File holding the theme preference.
    #[clap(long, default_value = "theme_settings.json")]
    pub prefs: String,

    /// Optional currency multiplier table (`CODE VALUE` per line).
    #[clap(long)]
    pub rates: Option<String>,
}
