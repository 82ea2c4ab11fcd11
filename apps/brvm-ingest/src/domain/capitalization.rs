//! Market capitalization extraction.
//!
//! Source columns (in order): symbol, company name, number of shares,
//! daily price, floating capitalization, global capitalization, global
//! capitalization percentage. The page exposes a short-form
//! `Last update: MM/DD/YYYY` label outside the table; that date stamps
//! every row of the run, falling back to the run date when the label is
//! missing or unparseable.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::normalize;
use super::record::{ExtractionContext, RecordRow, SqlValue, UpsertRecord};

/// Minimum cell count for a capitalization row.
const MIN_COLUMNS: usize = 7;

/// One company's capitalization snapshot, as persisted to the
/// `capitalisation` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapitalizationSnapshot {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// Outstanding share count.
    pub number_of_shares: Option<i64>,
    /// Daily quoted price.
    pub daily_price: Option<Decimal>,
    /// Floating capitalization.
    pub floating_capitalization: Option<Decimal>,
    /// Global capitalization.
    pub global_capitalization: Option<Decimal>,
    /// Share of the exchange's global capitalization, in percent.
    pub global_capitalization_percent: Option<Decimal>,
    /// Page-level "as of" date, shared across all rows of one run.
    pub as_of: NaiveDate,
}

impl CapitalizationSnapshot {
    /// Derived natural key: `{symbol}-{as_of}`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-{}", self.symbol, self.as_of.format("%Y-%m-%d"))
    }
}

impl UpsertRecord for CapitalizationSnapshot {
    const TABLE: &'static str = "capitalisation";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "symbol",
            "name",
            "number_of_shares",
            "daily_price",
            "floating_capitalization",
            "global_capitalization",
            "global_capitalization_per",
            "update_date",
        ]
    }

    fn to_row(&self) -> RecordRow {
        RecordRow::new(
            Some(self.id()),
            vec![
                SqlValue::from(self.symbol.clone()),
                SqlValue::from(self.name.clone()),
                SqlValue::from(self.number_of_shares),
                SqlValue::from(self.daily_price),
                SqlValue::from(self.floating_capitalization),
                SqlValue::from(self.global_capitalization),
                SqlValue::from(self.global_capitalization_percent),
                SqlValue::from(self.as_of),
            ],
        )
    }
}

/// Resolve the run's "as of" date from the page label, defaulting to the
/// run date.
fn as_of_date(ctx: &ExtractionContext) -> NaiveDate {
    ctx.page_label
        .as_deref()
        .and_then(normalize::last_update)
        .and_then(normalize::short_date)
        .unwrap_or(ctx.run_date)
}

/// Extract capitalization snapshots from raw table rows.
#[must_use]
pub fn extract(rows: &[Vec<String>], ctx: &ExtractionContext) -> Vec<CapitalizationSnapshot> {
    let as_of = as_of_date(ctx);
    rows.iter()
        .filter(|cells| cells.len() >= MIN_COLUMNS)
        .map(|cells| CapitalizationSnapshot {
            symbol: cells[0].clone(),
            name: cells[1].clone(),
            number_of_shares: normalize::integer(&cells[2]),
            daily_price: normalize::decimal(&cells[3]),
            floating_capitalization: normalize::decimal(&cells[4]),
            global_capitalization: normalize::decimal(&cells[5]),
            global_capitalization_percent: normalize::percent(&cells[6]),
            as_of,
        })
        .collect()
}
