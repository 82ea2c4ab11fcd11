//! Index snapshot extraction.
//!
//! Source columns (in order): index name, previous close, close, change
//! percent, year-to-date change percent. The index pages expose no
//! page-level date, so every run stamps all rows with the run date.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::normalize;
use super::record::{ExtractionContext, RecordRow, SqlValue, UpsertRecord};

/// Minimum cell count for an index row.
const MIN_COLUMNS: usize = 5;

/// One index close snapshot, as persisted to the `indexes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    /// Index name, e.g. `"BRVM Composite"`.
    pub index_name: String,
    /// Previous session close.
    pub previous_close: Option<Decimal>,
    /// Current close.
    pub close: Option<Decimal>,
    /// Session change, in percent.
    pub change_percent: Option<Decimal>,
    /// Year-to-date change, in percent.
    pub ytd_change_percent: Option<Decimal>,
    /// Run date; the index domain has no page-sourced date.
    pub as_of: NaiveDate,
}

impl IndexSnapshot {
    /// Derived natural key: `{index_name}-{as_of}`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-{}", self.index_name, self.as_of.format("%Y-%m-%d"))
    }
}

impl UpsertRecord for IndexSnapshot {
    const TABLE: &'static str = "indexes";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "index_name",
            "previous_close",
            "close",
            "change_percent",
            "ytd_change_percent",
            "update_date",
        ]
    }

    fn to_row(&self) -> RecordRow {
        RecordRow::new(
            Some(self.id()),
            vec![
                SqlValue::from(self.index_name.clone()),
                SqlValue::from(self.previous_close),
                SqlValue::from(self.close),
                SqlValue::from(self.change_percent),
                SqlValue::from(self.ytd_change_percent),
                SqlValue::from(self.as_of),
            ],
        )
    }
}

/// Extract index snapshots from raw table rows.
#[must_use]
pub fn extract(rows: &[Vec<String>], ctx: &ExtractionContext) -> Vec<IndexSnapshot> {
    rows.iter()
        .filter(|cells| cells.len() >= MIN_COLUMNS)
        .map(|cells| IndexSnapshot {
            index_name: cells[0].clone(),
            previous_close: normalize::decimal(&cells[1]),
            close: normalize::decimal(&cells[2]),
            change_percent: normalize::percent(&cells[3]),
            ytd_change_percent: normalize::percent(&cells[4]),
            as_of: ctx.run_date,
        })
        .collect()
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
            "BRVM Composite".to_string(),
            "237,19".to_string(),
            "239,45".to_string(),
            "0,95%".to_string(),
            "12,04%".to_string(),
        ]
    }

    #[test]
    fn extract_stamps_rows_with_run_date() {
        let snaps = extract(&[row()], &ctx());
        assert_eq!(snaps.len(), 1);
        let snap = &snaps[0];
        assert_eq!(snap.previous_close, Some(dec!(237.19)));
        assert_eq!(snap.close, Some(dec!(239.45)));
        assert_eq!(snap.change_percent, Some(dec!(0.95)));
        assert_eq!(snap.ytd_change_percent, Some(dec!(12.04)));
        assert_eq!(snap.id(), "BRVM Composite-2024-06-01");
    }

    #[test]
    fn differing_run_dates_never_collide() {
        let today = extract(&[row()], &ctx());
        let other = ExtractionContext::new(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        let tomorrow = extract(&[row()], &other);
        assert_ne!(today[0].id(), tomorrow[0].id());
    }

    #[test]
    fn short_rows_are_skipped() {
        let short = vec![vec!["BRVM 30".to_string(), "101,2".to_string()]];
        assert!(extract(&short, &ctx()).is_empty());
    }

    #[test]
    fn page_label_is_ignored_for_indexes() {
        let labeled = ctx().with_label("Last update: 01/15/2024");
        let snaps = extract(&[row()], &labeled);
        assert_eq!(snaps[0].as_of, labeled.run_date);
    }
}
