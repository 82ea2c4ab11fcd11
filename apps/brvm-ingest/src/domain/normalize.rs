//! Field normalizers for raw table cells.
//!
//! Every function takes one trimmed text cell and returns either a typed
//! value or `None`. Absence is a first-class outcome here: a cell that
//! fails to parse never becomes a zero or an empty string, it becomes
//! `None` and stays `None` all the way to storage.
//!
//! The source pages render numbers with non-breaking-space thousands
//! separators and a decimal comma (`"1 234,56"`), short dates as
//! `MM/DD/YYYY` and long dates as `"Friday, 15 March, 2024"` with an
//! optional ` - ...` range suffix.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

/// Thousands separators stripped before numeric parsing.
const SEPARATORS: [char; 2] = ['\u{a0}', ' '];

/// Labeled-prefix pattern for the page-level "as of" signal.
#[allow(clippy::unwrap_used)]
static LAST_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Last update:\s*(.*)").unwrap());

/// Parse a locale-formatted decimal cell.
///
/// Strips non-breaking and ordinary spaces, converts a decimal comma to
/// a decimal point, then parses. Returns `None` on empty input or any
/// non-numeric residue.
#[must_use]
pub fn decimal(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Parse an integer-valued cell (share counts, transaction counts).
///
/// Accepts the same separator conventions as [`decimal`] but rejects
/// fractional input.
#[must_use]
pub fn integer(cell: &str) -> Option<i64> {
    let cleaned: String = cell.chars().filter(|c| !SEPARATORS.contains(c)).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok()
}

/// Parse a percentage cell (`"12,5%"` -> `12.5`).
///
/// Strips one trailing `%` then defers to [`decimal`]. Idempotent when
/// re-applied to the string form of its own output.
#[must_use]
pub fn percent(cell: &str) -> Option<Decimal> {
    let stripped = cell.strip_suffix('%').unwrap_or(cell);
    decimal(stripped.trim_end())
}

/// Parse a short-form `MM/DD/YYYY` date cell.
#[must_use]
pub fn short_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell, "%m/%d/%Y").ok()
}

/// Parse a long-form `<Weekday>, <Day> <Month>, <Year>` date cell.
///
/// Only the portion before the first hyphen is significant; the pages
/// append a ` - HH:MM` range suffix. A weekday that does not match the
/// date is a mismatch and yields `None`.
#[must_use]
pub fn long_date(cell: &str) -> Option<NaiveDate> {
    let head = cell.split('-').next().unwrap_or(cell).trim();
    NaiveDate::parse_from_str(head, "%A, %d %B, %Y").ok()
}

/// Split a composite `<date> / <value>` cell on the literal ` / `
/// separator and parse each side independently.
///
/// Either side may be absent on its own: `"01/15/2024 / "` yields a
/// present date and an absent value. A cell with no separator is treated
/// as a bare date.
#[must_use]
pub fn date_value(cell: &str) -> (Option<NaiveDate>, Option<Decimal>) {
    match cell.split_once(" / ") {
        Some((date_part, value_part)) => {
            (short_date(date_part.trim()), decimal(value_part.trim()))
        }
        None => (short_date(cell.trim()), None),
    }
}

/// Extract the remainder of a `Last update: <rest>` page label.
///
/// The label is free text located outside the main table; anything after
/// the prefix is returned trimmed for date parsing by the caller.
#[must_use]
pub fn last_update(label: &str) -> Option<&str> {
    LAST_UPDATE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case("1 234,56", Some(dec!(1234.56)); "space separator and decimal comma")]
    #[test_case("1\u{a0}234\u{a0}567", Some(dec!(1234567)); "nbsp separators")]
    #[test_case("6.5", Some(dec!(6.5)); "already canonical")]
    #[test_case("abc", None; "non numeric")]
    #[test_case("", None; "empty")]
    #[test_case("12,34,56", None; "two decimal commas")]
    fn decimal_cells(cell: &str, expected: Option<Decimal>) {
        assert_eq!(decimal(cell), expected);
    }

    #[test_case("123 456", Some(123_456))]
    #[test_case("12,5", None; "fractional rejected")]
    #[test_case("", None)]
    fn integer_cells(cell: &str, expected: Option<i64>) {
        assert_eq!(integer(cell), expected);
    }

    #[test]
    fn percent_strips_trailing_sign() {
        assert_eq!(percent("12,5%"), Some(dec!(12.5)));
        assert_eq!(percent("-0,42%"), Some(dec!(-0.42)));
        assert_eq!(percent("%"), None);
    }

    #[test]
    fn percent_is_idempotent_on_its_own_output() {
        let once = percent("12,5%").unwrap();
        assert_eq!(percent(&once.to_string()), Some(once));
    }

    #[test]
    fn short_date_parses_mm_dd_yyyy() {
        assert_eq!(
            short_date("01/15/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(short_date("15/01/2024"), None);
        assert_eq!(short_date("2024-01-15"), None);
    }

    #[test]
    fn long_date_ignores_range_suffix() {
        assert_eq!(
            long_date("Friday, 15 March, 2024 - 16:00"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            long_date("Friday, 15 March, 2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn long_date_rejects_weekday_mismatch() {
        // 2024-03-15 was a Friday.
        assert_eq!(long_date("Monday, 15 March, 2024"), None);
    }

    #[test]
    fn date_value_splits_both_sides() {
        let (date, value) = date_value("01/15/2024 / 1 000,50");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(value, Some(dec!(1000.5)));
    }

    #[test]
    fn date_value_tolerates_missing_value() {
        let (date, value) = date_value("01/15/2024 / ");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(value, None);
    }

    #[test]
    fn date_value_without_separator_is_a_bare_date() {
        let (date, value) = date_value("01/15/2024");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(value, None);
    }

    #[test]
    fn date_value_garbage_is_fully_absent() {
        assert_eq!(date_value("n/a"), (None, None));
    }

    #[test]
    fn last_update_label_extraction() {
        assert_eq!(last_update("Last update: 01/15/2024"), Some("01/15/2024"));
        assert_eq!(
            last_update("Market data - Last update: Friday, 15 March, 2024"),
            Some("Friday, 15 March, 2024")
        );
        assert_eq!(last_update("Unknown update date"), None);
    }
}
