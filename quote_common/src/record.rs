//! Typed records exchanged with the quote API.
//!
//! Every record carries a stable `id`; the remaining fields are declared and
//! optional where the API may omit them. Money amounts are fixed-point
//! `Decimal`s, accepted from the API as numbers or numeric strings.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::currency::Currency;
use crate::error::QuoteError;

/// Stable identifier of a record.
pub type RecordId = u64;

/// Label used for items that carry no category.
pub const DEFAULT_CATEGORY: &str = "Sin categoría";

/// An addressable entity held in a [`Collection`](crate::collection::Collection).
pub trait Record: Clone {
    /// Stable unique identifier.
    fn id(&self) -> RecordId;
}

/// Display tag attached to statuses and priorities.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Badge {
    Secondary,
    Success,
    Info,
    Warn,
    Danger,
    Contrast,
}

/// Workflow state of a quote.
///
/// Labels outside the known set are kept verbatim in `Other` and written back
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, EnumString, Eq, PartialEq)]
#[serde(from = "String", into = "String")]
pub enum QuoteStatus {
    /// Still being negotiated.
    #[strum(serialize = "En Progreso")]
    Ongoing,
    /// Approved by management.
    #[strum(serialize = "Aprobada")]
    Approved,
    /// Label the API sent that is not listed above.
    #[strum(disabled)]
    Other(String),
}

impl QuoteStatus {
    /// Label as shown and as exchanged with the API.
    pub fn label(&self) -> &str {
        match self {
            QuoteStatus::Ongoing => "En Progreso",
            QuoteStatus::Approved => "Aprobada",
            QuoteStatus::Other(label) => label,
        }
    }

    /// Badge shown next to the status, if any.
    pub fn badge(&self) -> Option<Badge> {
        match self {
            QuoteStatus::Ongoing => Some(Badge::Info),
            QuoteStatus::Approved => Some(Badge::Contrast),
            QuoteStatus::Other(_) => None,
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for QuoteStatus {
    fn from(label: String) -> Self {
        label.parse().unwrap_or(QuoteStatus::Other(label))
    }
}

impl From<QuoteStatus> for String {
    fn from(status: QuoteStatus) -> Self {
        match status {
            QuoteStatus::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// Commercial priority of a quote.
///
/// Unknown labels round-trip through `Other` like [`QuoteStatus`].
#[derive(Debug, Clone, Serialize, Deserialize, EnumString, Eq, PartialEq)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    /// `Alta`.
    #[strum(serialize = "Alta")]
    High,
    /// `Normal`.
    #[strum(serialize = "Normal")]
    Normal,
    /// `Baja`.
    #[strum(serialize = "Baja")]
    Low,
    /// Label the API sent that is not listed above.
    #[strum(disabled)]
    Other(String),
}

impl Priority {
    /// Label as shown and as exchanged with the API.
    pub fn label(&self) -> &str {
        match self {
            Priority::High => "Alta",
            Priority::Normal => "Normal",
            Priority::Low => "Baja",
            Priority::Other(label) => label,
        }
    }

    /// Badge shown next to the priority, if any.
    pub fn badge(&self) -> Option<Badge> {
        match self {
            Priority::High => Some(Badge::Success),
            Priority::Normal => Some(Badge::Warn),
            Priority::Low => Some(Badge::Danger),
            Priority::Other(_) => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        label.parse().unwrap_or(Priority::Other(label))
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// Fields the API sends that a record does not declare.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// One priced line of a quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    /// Product description.
    #[serde(default)]
    pub product: String,
    /// Unit of measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Free-form category used for subtotals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Quantity ordered.
    #[serde(default)]
    pub quantity: Decimal,
    /// Unit price.
    #[serde(default)]
    pub price: Decimal,
    /// Undeclared fields, sent back as received.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl QuoteItem {
    /// `price × quantity`, or `Overflow` when it does not fit a `Decimal`.
    pub fn subtotal(&self) -> Result<Decimal, QuoteError> {
        self.price.checked_mul(self.quantity).ok_or_else(|| {
            QuoteError::Overflow(format!("{} x {}", self.price, self.quantity))
        })
    }

    /// Category trimmed, with inner whitespace collapsed, or [`DEFAULT_CATEGORY`].
    pub fn category_label(&self) -> String {
        let label = self
            .category
            .as_deref()
            .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        if label.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            label
        }
    }
}

/// Sum of item subtotals.
pub fn items_total(items: &[QuoteItem]) -> Result<Decimal, QuoteError> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        let subtotal = item.subtotal()?;
        sum.checked_add(subtotal)
            .ok_or_else(|| QuoteError::Overflow(format!("{} + {}", sum, subtotal)))
    })
}

/// A single cell edit on a quote item.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Quantity(Decimal),
    Price(Decimal),
    Product(String),
    Unit(String),
    Category(String),
}

/// A sales quote.
///
/// Optional fields the API left out stay out of the serialized form, and
/// undeclared fields are carried in `extra`, so writing a record back only
/// sends what was read plus the user's changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Stable identifier assigned by the API.
    pub id: RecordId,
    /// Client name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Salesperson who authored the quote.
    #[serde(default)]
    pub author: String,
    /// Total in `currency`; kept in sync with `items` on local edits.
    #[serde(default)]
    pub total_price: Decimal,
    /// Currency of `total_price` and of item prices.
    #[serde(default)]
    pub currency: Currency,
    /// Whether the quote turned into an order.
    #[serde(default)]
    pub order: bool,
    /// Workflow state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuoteStatus>,
    /// Commercial priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Manager who approved the quote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// Creation timestamp as sent by the API (RFC 3339 or plain date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Priced lines.
    #[serde(default)]
    pub items: Vec<QuoteItem>,
    /// Undeclared fields, sent back as received.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Record for Quote {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Quote {
    /// Recomputes `total_price` as the sum of item subtotals.
    ///
    /// Leaves the total untouched when the sum overflows.
    pub fn recompute_total(&mut self) -> Result<(), QuoteError> {
        self.total_price = items_total(&self.items)?;
        Ok(())
    }

    /// Applies a cell edit to the item at `index` and refreshes the total.
    ///
    /// The quote is left unchanged when the edit would overflow the total.
    pub fn update_item(&mut self, index: usize, edit: ItemEdit) -> Result<(), QuoteError> {
        let mut item = self
            .items
            .get(index)
            .cloned()
            .ok_or(QuoteError::NotFound(index as RecordId))?;
        match edit {
            ItemEdit::Quantity(q) => item.quantity = q,
            ItemEdit::Price(p) => item.price = p,
            ItemEdit::Product(p) => item.product = p,
            ItemEdit::Unit(u) => item.unit = Some(u),
            ItemEdit::Category(c) => item.category = Some(c),
        }
        let previous = std::mem::replace(&mut self.items[index], item);
        if let Err(e) = self.recompute_total() {
            self.items[index] = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// Autocomplete entry for clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Stable identifier.
    pub id: RecordId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Tax identification number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nit: Option<String>,
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Record for Client {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Autocomplete entry for products.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable identifier.
    pub id: RecordId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Catalogue price, when the API provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Catalogue category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Record for Product {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Autocomplete entry for units of measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Stable identifier.
    pub id: RecordId,
    /// Unit name, e.g. `m2`.
    #[serde(default)]
    pub name: String,
}

impl Record for Unit {
    fn id(&self) -> RecordId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, price: &str) -> QuoteItem {
        QuoteItem {
            quantity: Decimal::from(quantity),
            price: price.parse().unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn deserializes_api_payload_with_string_and_number_amounts() {
        let json = r#"{
            "id": 7,
            "author": "X",
            "totalPrice": "10.50",
            "currency": "USD",
            "order": true,
            "status": "Aprobada",
            "priority": "Alta",
            "items": [{"product": "Tubo", "quantity": 2, "price": 5.25}]
        }"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.id, 7);
        assert_eq!(quote.total_price, "10.50".parse::<Decimal>().unwrap());
        assert_eq!(quote.currency, Currency::USD);
        assert_eq!(quote.status, Some(QuoteStatus::Approved));
        assert_eq!(quote.priority.as_ref().and_then(Priority::badge), Some(Badge::Success));
        assert_eq!(quote.items[0].subtotal().unwrap(), "10.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let quote: Quote = serde_json::from_str(r#"{"id": 1, "status": "Archivada"}"#).unwrap();
        assert_eq!(quote.currency, Currency::COP);
        assert_eq!(quote.total_price, Decimal::ZERO);
        assert_eq!(quote.status, Some(QuoteStatus::Other("Archivada".into())));
        assert!(quote.items.is_empty());
    }

    #[test]
    fn written_back_quote_keeps_what_was_read() {
        let json = r#"{
            "id": 1,
            "status": "Archivada",
            "priority": "Urgente",
            "currency": "JPY",
            "notes": "llamar el lunes",
            "items": [{"product": "Tubo", "quantity": 1, "price": 2, "sku": "T-1"}]
        }"#;
        let mut quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.priority, Some(Priority::Other("Urgente".into())));
        assert_eq!(quote.currency, Currency::Other("JPY".into()));
        quote.author = "ANA".into();

        let written: serde_json::Value = serde_json::to_value(&quote).unwrap();
        assert_eq!(written["status"], "Archivada");
        assert_eq!(written["priority"], "Urgente");
        assert_eq!(written["currency"], "JPY");
        assert_eq!(written["notes"], "llamar el lunes");
        assert_eq!(written["items"][0]["sku"], "T-1");
        assert_eq!(written["author"], "ANA");
        for absent in ["client", "approvedBy", "createdAt"] {
            assert!(written.get(absent).is_none(), "{absent}");
        }
        assert!(written["items"][0].get("unit").is_none());

        let again: Quote = serde_json::from_value(written).unwrap();
        assert_eq!(again, quote);
    }

    #[test]
    fn known_labels_serialize_as_the_api_spells_them() {
        let quote = Quote {
            id: 2,
            status: Some(QuoteStatus::Ongoing),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        let written = serde_json::to_value(&quote).unwrap();
        assert_eq!(written["status"], "En Progreso");
        assert_eq!(written["priority"], "Baja");
        assert_eq!(written["currency"], "COP");
        assert!("Archivada".parse::<QuoteStatus>().is_err());
    }

    #[test]
    fn item_edit_recomputes_total() {
        let mut quote = Quote {
            id: 1,
            items: vec![item(2, "10"), item(1, "3.5")],
            ..Default::default()
        };
        quote.recompute_total().unwrap();
        assert_eq!(quote.total_price, "23.5".parse::<Decimal>().unwrap());

        quote.update_item(1, ItemEdit::Quantity(Decimal::from(4))).unwrap();
        assert_eq!(quote.total_price, Decimal::from(34));
    }

    #[test]
    fn item_edit_out_of_range_is_not_found() {
        let mut quote = Quote::default();
        let err = quote.update_item(3, ItemEdit::Price(Decimal::ONE)).unwrap_err();
        assert!(matches!(err, QuoteError::NotFound(3)));
    }

    #[test]
    fn overflowing_item_edit_is_rejected_and_leaves_quote_unchanged() {
        let mut quote = Quote {
            id: 1,
            items: vec![item(1, "79228162514264337593543950"), item(1, "1")],
            ..Default::default()
        };
        quote.recompute_total().unwrap();
        let before = quote.clone();

        let err = quote.update_item(0, ItemEdit::Quantity(Decimal::from(4000))).unwrap_err();
        assert!(matches!(err, QuoteError::Overflow(_)));
        assert_eq!(quote, before);

        let err = quote.update_item(1, ItemEdit::Price(Decimal::MAX)).unwrap_err();
        assert!(matches!(err, QuoteError::Overflow(_)));
        assert_eq!(quote, before);
    }

    #[test]
    fn category_label_is_trimmed_and_defaulted() {
        let mut it = item(1, "1");
        assert_eq!(it.category_label(), DEFAULT_CATEGORY);
        it.category = Some("   ".into());
        assert_eq!(it.category_label(), DEFAULT_CATEGORY);
        it.category = Some("  Tubería   PVC ".into());
        assert_eq!(it.category_label(), "Tubería PVC");
    }

    #[test]
    fn status_badges() {
        assert_eq!(QuoteStatus::Ongoing.badge(), Some(Badge::Info));
        assert_eq!(QuoteStatus::Approved.badge(), Some(Badge::Contrast));
        assert_eq!(Priority::Low.badge(), Some(Badge::Danger));
        assert_eq!(Badge::Contrast.to_string(), "contrast");
    }
}
