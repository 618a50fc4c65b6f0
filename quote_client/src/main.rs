//! Quote Console: a terminal front end for the quote API. It lists and searches
//! quotes, edits them optimistically, creates new ones, offers debounced
//! autocomplete for clients/products/units, prints dashboard figures, and keeps
//! the theme preference in a local file.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client --api-url http://localhost:3000 --rates ./rates.txt
//! ```
//!
//! Commands are read one per line from stdin; type `help` for the list.
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use log::{error, info, warn};
use quote_client::api::{HttpQuoteApi, RecordWriter, SearchSource};
use quote_client::console::{ConsoleCommand, HELP, ThemeCommand};
use quote_client::debounce::shared;
use quote_client::failure::FailureLog;
use quote_client::notify::{ChannelNotifier, Notification};
use quote_client::{DebouncePolicy, DebouncedQuery, EditOutcome, OptimisticMutation};
use quote_common::aggregate::{author_summaries, category_subtotals};
use quote_common::currency::{CurrencyTable, RateTableParser};
use quote_common::format::{format_currency, format_date};
use quote_common::preference::{FileStorage, PreferenceStore};
use quote_common::record::{Client, Product, Unit};
use quote_common::stats::summary_cards;
use quote_common::{Quote, QuoteError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader as AsyncBufReader};

/// Everything the console drives.
struct App {
    api: Arc<HttpQuoteApi>,
    quotes: DebouncedQuery<Quote>,
    clients: DebouncedQuery<Client>,
    products: DebouncedQuery<Product>,
    units: DebouncedQuery<Unit>,
    editor: Arc<OptimisticMutation<Quote>>,
    rates: CurrencyTable,
    prefs: PreferenceStore<FileStorage>,
}

impl App {
    fn new(args: &Args, notifier: ChannelNotifier) -> Result<Self> {
        let api = Arc::new(HttpQuoteApi::new(&args.api_url));
        let search = DebouncePolicy::new(
            args.min_search_len,
            Duration::from_millis(args.search_delay_ms),
        );
        let suggest = DebouncePolicy::new(
            args.min_suggest_len,
            Duration::from_millis(args.suggest_delay_ms),
        );

        let listed = shared(Vec::new());
        let quote_source: Arc<dyn SearchSource<Quote>> = api.clone();
        let client_source: Arc<dyn SearchSource<Client>> = api.clone();
        let product_source: Arc<dyn SearchSource<Product>> = api.clone();
        let unit_source: Arc<dyn SearchSource<Unit>> = api.clone();
        let writer: Arc<dyn RecordWriter<Quote>> = api.clone();

        let rates = match &args.rates {
            Some(raw) => load_rates(&normalize_path(raw))?,
            None => CurrencyTable::default(),
        };

        Ok(Self {
            quotes: DebouncedQuery::new("quotes", quote_source, search, listed.clone()),
            clients: DebouncedQuery::new("clients", client_source, suggest, shared(Vec::new())),
            products: DebouncedQuery::new("products", product_source, suggest, shared(Vec::new())),
            units: DebouncedQuery::new("units", unit_source, suggest, shared(Vec::new())),
            editor: Arc::new(OptimisticMutation::new(
                listed,
                writer,
                Arc::new(notifier),
                FailureLog::new(),
            )),
            rates,
            prefs: PreferenceStore::load(FileStorage::new(normalize_path(&args.prefs))),
            api,
        })
    }

    /// Runs one command; returns `false` when the console should exit.
    async fn handle(&mut self, command: ConsoleCommand) -> Result<bool> {
        match command {
            ConsoleCommand::Search(text) => self.quotes.on_input(&text)?,
            ConsoleCommand::Client(text) => self.clients.on_input(&text)?,
            ConsoleCommand::Product(text) => self.products.on_input(&text)?,
            ConsoleCommand::Unit(text) => self.units.on_input(&text)?,
            ConsoleCommand::List => self.print_list(),
            ConsoleCommand::Show(id) => self.print_quote(id)?,
            ConsoleCommand::Set { id, field, value } => {
                let mut edited = self
                    .quotes
                    .snapshot()
                    .into_iter()
                    .find(|q| q.id == id)
                    .ok_or(QuoteError::NotFound(id))?;
                field.apply(&mut edited, &value)?;
                let editor = Arc::clone(&self.editor);
                tokio::spawn(async move {
                    match editor.apply_edit(edited).await {
                        Ok(EditOutcome::Committed) => info!("Quote {} saved", id),
                        Ok(EditOutcome::RolledBack { .. }) => warn!("Quote {} reverted", id),
                        Err(e) => warn!("Edit of quote {} skipped: {}", id, e),
                    }
                });
            }
            ConsoleCommand::Item { id, index, edit } => {
                let total = self.editor.edit_item(id, index, edit)?;
                println!("Quote {} total is now {}", id, total);
            }
            ConsoleCommand::New {
                author,
                currency,
                client,
            } => {
                let draft = Quote {
                    author,
                    currency,
                    client: Some(client),
                    ..Default::default()
                };
                let editor = Arc::clone(&self.editor);
                tokio::spawn(async move {
                    if let Ok(Some(created)) = editor.create(draft).await {
                        info!("Quote {} created", created.id);
                    }
                });
            }
            ConsoleCommand::Authors => self.print_authors()?,
            ConsoleCommand::Stats => self.print_stats().await,
            ConsoleCommand::Suggestions => self.print_suggestions(),
            ConsoleCommand::Failures => {
                for f in self.editor.failures().entries() {
                    println!("{}  quote {}  {}", f.at.to_rfc3339(), f.record_id, f.detail);
                }
            }
            ConsoleCommand::Theme(theme) => self.theme(theme)?,
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn print_list(&self) {
        for q in self.quotes.snapshot() {
            println!(
                "{:>5}  {:<24} {:<24} {:>20}  {:<12} {}",
                q.id,
                q.client.as_deref().unwrap_or("-"),
                q.author,
                format_currency(q.total_price, &q.currency),
                q.status.as_ref().map(|s| s.to_string()).unwrap_or_default(),
                format_date(q.created_at.as_deref()),
            );
        }
    }

    fn print_quote(&self, id: u64) -> Result<()> {
        let results = self.quotes.results();
        let listed = results.lock()?;
        let q = listed.get(id).ok_or(QuoteError::NotFound(id))?;
        println!(
            "Quote {} for {} by {} ({})",
            q.id,
            q.client.as_deref().unwrap_or("-"),
            q.author,
            format_date(q.created_at.as_deref())
        );
        for (i, item) in q.items.iter().enumerate() {
            println!(
                "  [{}] {:<30} {:>8} {:<6} x {:>16} = {:>18}  {}",
                i,
                item.product,
                item.quantity,
                item.unit.as_deref().unwrap_or(""),
                format_currency(item.price, &q.currency),
                format_currency(item.subtotal()?, &q.currency),
                item.category_label(),
            );
        }
        for (category, subtotal) in category_subtotals(&q.items)? {
            println!("  {:<40} {:>20}", category, format_currency(subtotal, &q.currency));
        }
        println!("  Total {:>54}", format_currency(q.total_price, &q.currency));
        Ok(())
    }

    fn print_authors(&self) -> Result<()> {
        for row in author_summaries(&self.quotes.snapshot(), &self.rates)? {
            println!(
                "{:<30} quotes={:<4} total={:>18} success={}%",
                row.author, row.quotes, row.total, row.success
            );
        }
        Ok(())
    }

    async fn print_stats(&self) {
        let rows = match self.api.fetch_stats().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{}", QuoteError::RemoteRead(e.to_string()));
                Vec::new()
            }
        };
        for card in summary_cards(&rows) {
            println!(
                "{:<14} current={:<14} last={:<14} ({})",
                card.title, card.current, card.last, card.subtitle
            );
        }
    }

    fn print_suggestions(&self) {
        let names = |v: Vec<String>| v.join(", ");
        println!(
            "clients:  {}",
            names(self.clients.snapshot().into_iter().map(|c| c.name).collect())
        );
        println!(
            "products: {}",
            names(self.products.snapshot().into_iter().map(|p| p.name).collect())
        );
        println!(
            "units:    {}",
            names(self.units.snapshot().into_iter().map(|u| u.name).collect())
        );
    }

    fn theme(&mut self, command: ThemeCommand) -> Result<()> {
        match command {
            ThemeCommand::Show => {}
            ThemeCommand::Primary(name) => self.prefs.set_primary(&name)?,
            ThemeCommand::Surface(name) => self.prefs.set_surface(&name)?,
            ThemeCommand::ToggleDark => {
                self.prefs.toggle_dark_mode()?;
            }
        }
        let p = self.prefs.current();
        println!(
            "primary={} surface={} dark={}",
            p.primary,
            p.surface.as_deref().unwrap_or("default"),
            p.dark_mode
        );
        Ok(())
    }
}

/// Prints toasts as they arrive, until every sender is gone.
fn start_toast_thread(rx: Receiver<Notification>) {
    thread::spawn(move || {
        for n in rx.iter() {
            println!("[{}] {}: {}", n.severity, n.summary, n.detail);
        }
        info!("Toast thread stopping...");
    });
}

async fn run(args: Args) -> Result<()> {
    let (toast_tx, toast_rx) = unbounded::<Notification>();
    start_toast_thread(toast_rx);

    let mut app = App::new(&args, ChannelNotifier::new(toast_tx))?;
    info!("Using quote API at {}", app.api.base_url());
    app.quotes.refresh()?;

    println!("{}", HELP);
    let mut lines = AsyncBufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => match app.handle(command).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => error!("{}", e),
                    },
                    Err(e) => warn!("{} (type `help`)", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received. Shutting down console...");
                break;
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn load_rates(path: &PathBuf) -> Result<CurrencyTable> {
    if !is_file_exist(path) {
        return Err(QuoteError::Format(format!(
            "rate table {} does not exist",
            path.display()
        )));
    }
    let table = CurrencyTable::parse_from_reader(BufReader::new(File::open(path)?))?;
    info!("Currency multipliers loaded from {}", path.display());
    Ok(table)
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

/// Returns `true` if the provided path exists and is a regular file.
fn is_file_exist(path: &PathBuf) -> bool {
    path.exists() && path.is_file()
}
