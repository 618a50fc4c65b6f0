//! Monthly dashboard figures returned by the API root endpoint.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::aggregate::to_fixed2;

/// Period tag for the current month row.
pub const CURRENT_MONTH: &str = "Current Month";
/// Period tag for the previous month row.
pub const LAST_MONTH: &str = "Last Month";

/// One period row. Figures arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StatsRow {
    /// Period tag (`Current Month` / `Last Month`).
    #[serde(default)]
    pub datequery: String,
    /// Quotes issued in the period.
    #[serde(default)]
    pub totalquotes: Option<Value>,
    /// Quotes that became orders.
    #[serde(default)]
    pub totalorders: Option<Value>,
    /// Revenue of the period's orders.
    #[serde(default)]
    pub revenue: Option<Value>,
    /// Success rate in percent.
    #[serde(default)]
    pub success: Option<Value>,
}

/// A summary card: current and previous month values, already rendered.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: &'static str,
    pub icon: &'static str,
    pub subtitle: &'static str,
    pub current: String,
    pub last: String,
}

fn as_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count(value: Option<&Value>) -> String {
    as_decimal(value).unwrap_or_default().normalize().to_string()
}

fn money(value: Option<&Value>) -> String {
    to_fixed2(as_decimal(value).unwrap_or_default())
}

fn percent(value: Option<&Value>) -> String {
    match as_decimal(value) {
        Some(d) if !d.is_zero() => format!("{}%", d.normalize()),
        _ => "0%".to_string(),
    }
}

/// Builds the four dashboard cards; missing rows or fields render as zero.
pub fn summary_cards(rows: &[StatsRow]) -> Vec<StatCard> {
    let empty = StatsRow::default();
    let find = |tag: &str| rows.iter().find(|r| r.datequery == tag).unwrap_or(&empty);
    let current = find(CURRENT_MONTH);
    let last = find(LAST_MONTH);

    vec![
        StatCard {
            title: "Total Quotes",
            icon: "pi-shopping-cart",
            subtitle: "Quotes",
            current: count(current.totalquotes.as_ref()),
            last: count(last.totalquotes.as_ref()),
        },
        StatCard {
            title: "Total Orders",
            icon: "pi-list",
            subtitle: "Orders",
            current: count(current.totalorders.as_ref()),
            last: count(last.totalorders.as_ref()),
        },
        StatCard {
            title: "Revenue",
            icon: "pi-dollar",
            subtitle: "Revenue",
            current: money(current.revenue.as_ref()),
            last: money(last.revenue.as_ref()),
        },
        StatCard {
            title: "Success Rate",
            icon: "pi-chart-line",
            subtitle: "Success",
            current: percent(current.success.as_ref()),
            last: percent(last.success.as_ref()),
        },
    ]
}
