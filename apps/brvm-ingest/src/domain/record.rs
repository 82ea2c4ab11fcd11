//! Flat record representation shared by every domain.
//!
//! Each extracted record converts to a [`RecordRow`] - an ordered list of
//! typed SQL values matching the record type's column list - before it
//! reaches a store. Absence survives the conversion: a `None` field
//! becomes a typed SQL NULL, never a sentinel string.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A typed SQL value, carrying its nullability.
///
/// Each variant wraps an `Option` so that a NULL still knows the column
/// type it binds to (PostgreSQL rejects untyped NULL parameters against
/// typed columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Text column.
    Text(Option<String>),
    /// Arbitrary-precision numeric column.
    Decimal(Option<Decimal>),
    /// 64-bit integer column (share counts, transaction counts).
    BigInt(Option<i64>),
    /// 32-bit integer column (years).
    Integer(Option<i32>),
    /// Date column.
    Date(Option<NaiveDate>),
}

impl SqlValue {
    /// Whether this value is a SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Text(None)
                | Self::Decimal(None)
                | Self::BigInt(None)
                | Self::Integer(None)
                | Self::Date(None)
        )
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(Some(v))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_string()))
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(Some(v))
    }
}

impl From<Option<Decimal>> for SqlValue {
    fn from(v: Option<Decimal>) -> Self {
        Self::Decimal(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::BigInt(Some(v))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(v: Option<i64>) -> Self {
        Self::BigInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Integer(Some(v))
    }
}

impl From<Option<i32>> for SqlValue {
    fn from(v: Option<i32>) -> Self {
        Self::Integer(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(Some(v))
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(v: Option<NaiveDate>) -> Self {
        Self::Date(v)
    }
}

/// One record flattened to its column values.
///
/// `values` is ordered to match [`UpsertRecord::columns`], with the
/// derived id first. `key` duplicates the id for stores that need to
/// index without re-parsing the value list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    /// Derived natural key, absent when any id component was absent.
    pub key: Option<String>,
    /// Column values, id first.
    pub values: Vec<SqlValue>,
}

impl RecordRow {
    /// Build a row from a derived id and the remaining field values.
    #[must_use]
    pub fn new(key: Option<String>, fields: Vec<SqlValue>) -> Self {
        let mut values = Vec::with_capacity(fields.len() + 1);
        values.push(SqlValue::Text(key.clone()));
        values.extend(fields);
        Self { key, values }
    }
}

/// A domain record that can be persisted by the batched upsert writer.
pub trait UpsertRecord {
    /// Target table name.
    const TABLE: &'static str;

    /// Conflict key column.
    const KEY_COLUMN: &'static str = "id";

    /// Column list, key column first, matching [`UpsertRecord::to_row`].
    fn columns() -> &'static [&'static str];

    /// Flatten to an ordered row of typed SQL values.
    fn to_row(&self) -> RecordRow;
}

/// Page-level context threaded into every extractor call.
///
/// The source pages expose at most one "as of" signal outside the main
/// table (a `Last update:` label); it travels here as an explicit
/// parameter together with the run date, instead of living in ambient
/// mutable state.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// Free-form page label text (e.g. `"Last update: 01/15/2024"`), if
    /// the page exposed one.
    pub page_label: Option<String>,
    /// Date the extraction run executes; the fallback "as of" date.
    pub run_date: NaiveDate,
}

impl ExtractionContext {
    /// Context with no page label.
    #[must_use]
    pub const fn new(run_date: NaiveDate) -> Self {
        Self {
            page_label: None,
            run_date,
        }
    }

    /// Attach the page-level label text.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.page_label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_prepends_key_as_first_value() {
        let row = RecordRow::new(Some("X-2024-01-15".into()), vec![SqlValue::from(1_i64)]);
        assert_eq!(row.values.len(), 2);
        assert_eq!(row.values[0], SqlValue::Text(Some("X-2024-01-15".into())));
        assert_eq!(row.key.as_deref(), Some("X-2024-01-15"));
    }

    #[test]
    fn absent_key_is_a_typed_null() {
        let row = RecordRow::new(None, vec![]);
        assert!(row.values[0].is_null());
        assert_eq!(row.values[0], SqlValue::Text(None));
    }

    #[test]
    fn absence_converts_to_typed_nulls() {
        assert!(SqlValue::from(Option::<Decimal>::None).is_null());
        assert!(SqlValue::from(Option::<NaiveDate>::None).is_null());
        assert!(!SqlValue::from(42_i32).is_null());
    }
}
