//! Trading volume extraction.
//!
//! Source columns (in order): symbol, company name, number of
//! transactions, traded value, value per transaction, percent of global
//! traded value. The page exposes a long-form
//! `Last update: <Weekday>, <Day> <Month>, <Year>` label; its date
//! stamps the rows. Rows left dateless fall back to the most common
//! parsed date among the run's rows, and when no row yields a date at
//! all the "as of" date stays absent and persists as NULL.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::normalize;
use super::record::{ExtractionContext, RecordRow, SqlValue, UpsertRecord};

/// Minimum cell count for a volume row.
const MIN_COLUMNS: usize = 6;

/// One company's traded-volume snapshot, as persisted to the `volumes`
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSnapshot {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// Number of transactions.
    pub number_of_transactions: Option<i64>,
    /// Total traded value.
    pub traded_value: Option<Decimal>,
    /// Value per transaction.
    pub per_transaction_value: Option<Decimal>,
    /// Share of the exchange's global traded value, in percent.
    pub percent_global_traded_value: Option<Decimal>,
    /// Page-level "as of" date; absent when nothing on the page parsed.
    pub as_of: Option<NaiveDate>,
}

impl VolumeSnapshot {
    /// Derived natural key: `{name}{as_of}` with no separator, absent
    /// when the "as of" date is absent.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.as_of
            .map(|date| format!("{}{}", self.name, date.format("%Y-%m-%d")))
    }
}

impl UpsertRecord for VolumeSnapshot {
    const TABLE: &'static str = "volumes";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "symbol",
            "name",
            "number_of_transactions",
            "traded_value",
            "per",
            "percent_global_traded_value",
            "update_date",
        ]
    }

    fn to_row(&self) -> RecordRow {
        RecordRow::new(
            self.id(),
            vec![
                SqlValue::from(self.symbol.clone()),
                SqlValue::from(self.name.clone()),
                SqlValue::from(self.number_of_transactions),
                SqlValue::from(self.traded_value),
                SqlValue::from(self.per_transaction_value),
                SqlValue::from(self.percent_global_traded_value),
                SqlValue::from(self.as_of),
            ],
        )
    }
}

/// Most frequent date among the present values, ties broken by the
/// earlier date so the result does not depend on iteration order.
fn most_common_date<I>(dates: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for date in dates.into_iter().flatten() {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(date, _)| date)
}

/// Fill dateless records with the run's most common parsed date.
///
/// When no record carries a date, all stay absent; the run is not
/// failed over it.
fn fill_missing_as_of(records: &mut [VolumeSnapshot]) {
    let fallback = most_common_date(records.iter().map(|r| r.as_of));
    if let Some(date) = fallback {
        for record in records.iter_mut().filter(|r| r.as_of.is_none()) {
            record.as_of = Some(date);
        }
    }
}

/// Extract volume snapshots from raw table rows.
#[must_use]
pub fn extract(rows: &[Vec<String>], ctx: &ExtractionContext) -> Vec<VolumeSnapshot> {
    let label_date = ctx
        .page_label
        .as_deref()
        .and_then(normalize::last_update)
        .and_then(normalize::long_date);
    let mut records: Vec<VolumeSnapshot> = rows
        .iter()
        .filter(|cells| cells.len() >= MIN_COLUMNS)
        .map(|cells| VolumeSnapshot {
            symbol: cells[0].clone(),
            name: cells[1].clone(),
            number_of_transactions: normalize::integer(&cells[2]),
            traded_value: normalize::decimal(&cells[3]),
            per_transaction_value: normalize::decimal(&cells[4]),
            percent_global_traded_value: normalize::percent(&cells[5]),
            as_of: label_date,
        })
        .collect();
    fill_missing_as_of(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx() -> ExtractionContext {
        ExtractionContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn row() -> Vec<String> {
        vec![
            "SNTS".to_string(),
            "SONATEL SN".to_string(),
            "1 243".to_string(),
            "817 530 250".to_string(),
            "657 708,97".to_string(),
            "23,90%".to_string(),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn extract_parses_long_form_label() {
        let labeled = ctx().with_label("Last update: Friday, 15 March, 2024 - 16:00");
        let snaps = extract(&[row()], &labeled);
        let snap = &snaps[0];
        assert_eq!(snap.as_of, Some(date(2024, 3, 15)));
        assert_eq!(snap.number_of_transactions, Some(1243));
        assert_eq!(snap.traded_value, Some(dec!(817_530_250)));
        assert_eq!(snap.per_transaction_value, Some(dec!(657_708.97)));
        assert_eq!(snap.percent_global_traded_value, Some(dec!(23.90)));
        assert_eq!(snap.id().as_deref(), Some("SONATEL SN2024-03-15"));
    }

    #[test]
    fn unparseable_label_leaves_as_of_absent() {
        let labeled = ctx().with_label("Unknown update date");
        let snaps = extract(&[row()], &labeled);
        assert_eq!(snaps[0].as_of, None);
        assert_eq!(snaps[0].id(), None);
        let flat = snaps[0].to_row();
        assert!(flat.values[0].is_null()); // id
        assert!(flat.values[7].is_null()); // update_date
    }

    #[test]
    fn most_common_date_picks_the_majority() {
        let a = date(2024, 3, 15);
        let b = date(2024, 3, 14);
        assert_eq!(
            most_common_date(vec![Some(a), Some(b), Some(a), None]),
            Some(a)
        );
    }

    #[test]
    fn most_common_date_of_nothing_is_absent() {
        assert_eq!(most_common_date(vec![None, None]), None);
        assert_eq!(most_common_date(Vec::new()), None);
    }

    #[test]
    fn fill_uses_majority_date_for_noisy_rows() {
        let majority = date(2024, 3, 15);
        let mut records = extract(&[row(), row(), row()], &ctx());
        records[0].as_of = Some(majority);
        records[1].as_of = Some(majority);
        fill_missing_as_of(&mut records);
        assert_eq!(records[2].as_of, Some(majority));
    }

    #[test]
    fn short_rows_are_skipped() {
        let labeled = ctx().with_label("Last update: Friday, 15 March, 2024");
        let short = vec![vec!["SNTS".to_string(), "SONATEL SN".to_string()]];
        assert!(extract(&short, &labeled).is_empty());
    }
}
