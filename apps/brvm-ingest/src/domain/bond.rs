//! Bond quote extraction from the bond board table.
//!
//! Source columns (in order): symbol, display name, issue date, maturity
//! date, daily price, interest rate, last payment (`<date> / <value>`
//! composite). The display name additionally encodes bond type, coupon
//! rate and issue/maturity years (`"TPCI 6,5% 2019-2024"`), which are
//! re-derived here; the scraped maturity-date column is discarded in
//! favor of the maturity year taken from the name.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::normalize;
use super::record::{ExtractionContext, RecordRow, SqlValue, UpsertRecord};

/// Minimum cell count for a bond row; shorter rows are skipped.
const MIN_COLUMNS: usize = 7;

/// `<type> <coupon>% <issueYear>-<maturityYear>`
#[allow(clippy::unwrap_used)]
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s+(\d+[,.]\d+)%\s+(\d{4})-(\d{4})$").unwrap());

/// Spaced-hyphen variant: `<type> <coupon>% <issueYear> - <maturityYear>`
#[allow(clippy::unwrap_used)]
static NAME_PATTERN_SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s+(\d+[,.]\d+)%\s+(\d{4})\s*-\s*(\d{4})$").unwrap());

/// Components decomposed from a bond display name.
///
/// All four are absent together when neither name shape matches; the
/// record is still emitted in that case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondNameParts {
    /// Issuer/instrument type prefix, e.g. `"TPCI"`.
    pub bond_type: Option<String>,
    /// Coupon rate from the name, e.g. `6.5`.
    pub coupon_rate: Option<Decimal>,
    /// Four-digit issue year.
    pub issue_year: Option<i32>,
    /// Four-digit maturity year.
    pub maturity_year: Option<i32>,
}

impl BondNameParts {
    /// Decompose a display name against the two known shapes, first
    /// match wins.
    #[must_use]
    pub fn decompose(name: &str) -> Self {
        for pattern in [&*NAME_PATTERN, &*NAME_PATTERN_SPACED] {
            if let Some(caps) = pattern.captures(name) {
                return Self {
                    bond_type: caps.get(1).map(|m| m.as_str().trim().to_string()),
                    coupon_rate: caps.get(2).and_then(|m| normalize::decimal(m.as_str())),
                    issue_year: caps.get(3).and_then(|m| m.as_str().parse().ok()),
                    maturity_year: caps.get(4).and_then(|m| m.as_str().parse().ok()),
                };
            }
        }
        Self::default()
    }
}

/// One bond quotation, as persisted to the `obligations` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondQuote {
    /// Ticker symbol.
    pub symbol: String,
    /// Full display name.
    pub name: String,
    /// Issue date from the table (distinct from the issue year in the
    /// name).
    pub issue_date: Option<NaiveDate>,
    /// Maturity year re-derived from the display name.
    pub maturity_year: Option<i32>,
    /// Daily quoted price.
    pub daily_price: Option<Decimal>,
    /// Interest rate.
    pub interest: Option<Decimal>,
    /// Date of the last coupon payment.
    pub last_payment_date: Option<NaiveDate>,
    /// Value paid at the last coupon payment.
    pub last_payment_value: Option<Decimal>,
    /// Name-derived components.
    pub name_parts: BondNameParts,
}

impl BondQuote {
    /// Derived natural key: `{bond_type}-{last_payment_date}` with
    /// whitespace stripped.
    ///
    /// Absent whenever either component is absent - never a partially
    /// formed string with an embedded missing-value sentinel.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        let bond_type = self.name_parts.bond_type.as_deref()?;
        let date = self.last_payment_date?;
        let compact: String = bond_type.split_whitespace().collect();
        Some(format!("{compact}-{}", date.format("%Y-%m-%d")))
    }
}

impl UpsertRecord for BondQuote {
    const TABLE: &'static str = "obligations";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "symbol",
            "name",
            "issue_date",
            "maturity_date",
            "daily_price",
            "interest",
            "last_payment_date",
            "value",
            "coupon_rate",
            "issue_year",
            "bond_type",
        ]
    }

    fn to_row(&self) -> RecordRow {
        RecordRow::new(
            self.id(),
            vec![
                SqlValue::from(self.symbol.clone()),
                SqlValue::from(self.name.clone()),
                SqlValue::from(self.issue_date),
                SqlValue::from(self.maturity_year),
                SqlValue::from(self.daily_price),
                SqlValue::from(self.interest),
                SqlValue::from(self.last_payment_date),
                SqlValue::from(self.last_payment_value),
                SqlValue::from(self.name_parts.coupon_rate),
                SqlValue::from(self.name_parts.issue_year),
                SqlValue::from(self.name_parts.bond_type.clone()),
            ],
        )
    }
}

/// Extract bond quotes from raw table rows.
///
/// The bond board carries no page-level "as of" date, so the context is
/// accepted for signature uniformity only. Rows shorter than
/// [`MIN_COLUMNS`] are skipped.
#[must_use]
pub fn extract(rows: &[Vec<String>], _ctx: &ExtractionContext) -> Vec<BondQuote> {
    rows.iter()
        .filter(|cells| cells.len() >= MIN_COLUMNS)
        .map(|cells| {
            let name = cells[1].clone();
            let name_parts = BondNameParts::decompose(&name);
            let (last_payment_date, last_payment_value) = normalize::date_value(&cells[6]);
            BondQuote {
                symbol: cells[0].clone(),
                name,
                issue_date: normalize::short_date(&cells[2]),
                // cells[3] is the scraped maturity date, superseded by
                // the year in the name.
                maturity_year: name_parts.maturity_year,
                daily_price: normalize::decimal(&cells[4]),
                interest: normalize::decimal(&cells[5]),
                last_payment_date,
                last_payment_value,
                name_parts,
            }
        })
        .collect()
}
