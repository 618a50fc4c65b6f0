//! Line commands understood by the console front end.
//!
//! Each line is one command; free-text arguments (search text, field values)
//! take the rest of the line verbatim.
use std::str::FromStr;

use quote_common::QuoteError;
use quote_common::currency::Currency;
use quote_common::record::{ItemEdit, Priority, Quote, QuoteStatus, RecordId};
use rust_decimal::Decimal;

/// Editable quote fields.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    Client,
    Author,
    TotalPrice,
    Currency,
    Order,
    Status,
    Priority,
    ApprovedBy,
}

impl FromStr for QuoteField {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(QuoteField::Client),
            "author" => Ok(QuoteField::Author),
            "total" | "price" | "totalprice" => Ok(QuoteField::TotalPrice),
            "currency" => Ok(QuoteField::Currency),
            "order" => Ok(QuoteField::Order),
            "status" => Ok(QuoteField::Status),
            "priority" => Ok(QuoteField::Priority),
            "approved" | "approvedby" => Ok(QuoteField::ApprovedBy),
            other => Err(QuoteError::Format(format!("unknown field `{}`", other))),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, QuoteError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "si" | "sí" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(QuoteError::Format(format!("expected yes/no, got `{}`", other))),
    }
}

impl QuoteField {
    /// Writes `value` into the matching field of `quote`.
    pub fn apply(self, quote: &mut Quote, value: &str) -> Result<(), QuoteError> {
        let value = value.trim();
        match self {
            QuoteField::Client => quote.client = Some(value.to_string()),
            QuoteField::Author => quote.author = value.to_string(),
            QuoteField::TotalPrice => quote.total_price = value.parse()?,
            QuoteField::Currency => {
                quote.currency = value
                    .parse::<Currency>()
                    .map_err(|e| QuoteError::Format(format!("{}: {}", value, e)))?
            }
            QuoteField::Order => quote.order = parse_flag(value)?,
            QuoteField::Status => {
                quote.status = Some(
                    value
                        .parse::<QuoteStatus>()
                        .map_err(|e| QuoteError::Format(format!("{}: {}", value, e)))?,
                )
            }
            QuoteField::Priority => {
                quote.priority = Some(
                    value
                        .parse::<Priority>()
                        .map_err(|e| QuoteError::Format(format!("{}: {}", value, e)))?,
                )
            }
            QuoteField::ApprovedBy => quote.approved_by = Some(value.to_string()),
        }
        Ok(())
    }
}

/// Theme sub-commands.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeCommand {
    Show,
    Primary(String),
    Surface(String),
    ToggleDark,
}

/// One console command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Type into the quote search box.
    Search(String),
    /// Type into the client autocomplete.
    Client(String),
    /// Type into the product autocomplete.
    Product(String),
    /// Type into the unit autocomplete.
    Unit(String),
    /// Print the quote list.
    List,
    /// Print one quote with its items and category subtotals.
    Show(RecordId),
    /// Edit a quote field and save it.
    Set {
        /// Quote to edit.
        id: RecordId,
        /// Field to change.
        field: QuoteField,
        /// New value, as typed.
        value: String,
    },
    /// Edit an item cell locally.
    Item {
        /// Quote holding the item.
        id: RecordId,
        /// Zero-based item position.
        index: usize,
        /// Cell change.
        edit: ItemEdit,
    },
    /// Create a quote.
    New {
        /// Salesperson.
        author: String,
        /// Pricing currency.
        currency: Currency,
        /// Client name.
        client: String,
    },
    /// Per-author summary table.
    Authors,
    /// Monthly dashboard cards.
    Stats,
    /// Current autocomplete suggestions.
    Suggestions,
    /// Failed writes.
    Failures,
    /// Show or change the theme preference.
    Theme(ThemeCommand),
    /// Print [`HELP`].
    Help,
    /// Leave the console.
    Quit,
}

/// Help text listing every command.
pub const HELP: &str = "\
search <text>                     search quotes (debounced)
client|product|unit <text>        autocomplete (debounced)
list | show <id>                  list quotes / show one quote
set <id> <field> <value>          edit and save: client author total currency order status priority approved
item <id> <n> <field> <value>     edit item n locally: quantity price product unit category
new <author> <currency> <client>  create a quote
authors | stats | suggestions     summaries
failures                          failed writes
theme [primary <name> | surface <name> | dark]
help | quit";

fn id_arg(token: Option<&str>) -> Result<RecordId, QuoteError> {
    let token = token.ok_or_else(|| QuoteError::Format("missing id".into()))?;
    token
        .parse()
        .map_err(|_| QuoteError::Format(format!("invalid id `{}`", token)))
}

fn rest_required(rest: &str, what: &str) -> Result<String, QuoteError> {
    let rest = rest.trim();
    if rest.is_empty() {
        Err(QuoteError::Format(format!("missing {}", what)))
    } else {
        Ok(rest.to_string())
    }
}

fn item_edit(field: &str, value: &str) -> Result<ItemEdit, QuoteError> {
    let value = rest_required(value, "value")?;
    match field.to_ascii_lowercase().as_str() {
        "quantity" | "qty" => Ok(ItemEdit::Quantity(value.parse::<Decimal>()?)),
        "price" => Ok(ItemEdit::Price(value.parse::<Decimal>()?)),
        "product" => Ok(ItemEdit::Product(value)),
        "unit" => Ok(ItemEdit::Unit(value)),
        "category" => Ok(ItemEdit::Category(value)),
        other => Err(QuoteError::Format(format!("unknown item field `{}`", other))),
    }
}

/// Splits off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

impl FromStr for ConsoleCommand {
    type Err = QuoteError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = split_word(line);
        // Free text keeps inner spacing; only the separator after the verb goes.
        let text = rest.strip_prefix(' ').unwrap_or(rest).to_string();

        match verb.to_ascii_lowercase().as_str() {
            "search" => Ok(ConsoleCommand::Search(text)),
            "client" => Ok(ConsoleCommand::Client(text)),
            "product" => Ok(ConsoleCommand::Product(text)),
            "unit" => Ok(ConsoleCommand::Unit(text)),
            "list" | "ls" => Ok(ConsoleCommand::List),
            "show" => Ok(ConsoleCommand::Show(id_arg(
                Some(split_word(rest).0).filter(|s| !s.is_empty()),
            )?)),
            "set" => {
                let (id, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                Ok(ConsoleCommand::Set {
                    id: id_arg(Some(id).filter(|s| !s.is_empty()))?,
                    field: field.parse()?,
                    value: rest_required(value, "value")?,
                })
            }
            "item" => {
                let (id, rest) = split_word(rest);
                let (index, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                let index = index
                    .parse()
                    .map_err(|_| QuoteError::Format(format!("invalid item index `{}`", index)))?;
                Ok(ConsoleCommand::Item {
                    id: id_arg(Some(id).filter(|s| !s.is_empty()))?,
                    index,
                    edit: item_edit(field, value)?,
                })
            }
            "new" => {
                let (author, rest) = split_word(rest);
                let (currency, client) = split_word(rest);
                if author.is_empty() {
                    return Err(QuoteError::Format("missing author".into()));
                }
                Ok(ConsoleCommand::New {
                    author: author.to_string(),
                    currency: currency
                        .parse()
                        .map_err(|e| QuoteError::Format(format!("{}: {}", currency, e)))?,
                    client: rest_required(client, "client")?,
                })
            }
            "authors" => Ok(ConsoleCommand::Authors),
            "stats" => Ok(ConsoleCommand::Stats),
            "suggestions" => Ok(ConsoleCommand::Suggestions),
            "failures" => Ok(ConsoleCommand::Failures),
            "theme" => {
                let (sub, value) = split_word(rest);
                match sub.to_ascii_lowercase().as_str() {
                    "" => Ok(ConsoleCommand::Theme(ThemeCommand::Show)),
                    "dark" => Ok(ConsoleCommand::Theme(ThemeCommand::ToggleDark)),
                    "primary" => Ok(ConsoleCommand::Theme(ThemeCommand::Primary(
                        rest_required(value, "palette")?,
                    ))),
                    "surface" => Ok(ConsoleCommand::Theme(ThemeCommand::Surface(
                        rest_required(value, "palette")?,
                    ))),
                    other => Err(QuoteError::Format(format!("unknown theme option `{}`", other))),
                }
            }
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(QuoteError::Format(format!("unknown command `{}`", other))),
        }
    }
}
