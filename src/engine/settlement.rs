//! Early-termination settlement of an existing rental contract.
//!
//! Walks the contract year by year from its start date, escalating the
//! monthly rental at every anniversary, and sums what is still owed after
//! the as-of date.

use crate::domain::decimal::lenient;
use crate::domain::deal::DEFAULT_TERM_MONTHS;
use crate::domain::Decimal;
use chrono::{Months, NaiveDate};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

const MONTHS_PER_YEAR: u32 = 12;
/// Longest contract the walk will expand, in months.
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Whether the supplied rental is the contract's first-year amount or the
/// amount currently being paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalBasis {
    #[default]
    Starting,
    Current,
}

/// Settlement inputs as entered by the operator.
///
/// An unparseable start date or rental amount deserializes to `None`, which
/// makes the request non-computable rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::maybe_decimal")]
    pub rental_amount: Option<Decimal>,
    #[serde(default)]
    pub rental_basis: RentalBasis,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub escalation_percent: Decimal,
    #[serde(default = "default_term", deserialize_with = "lenient::quantity")]
    pub term_months: u32,
    #[serde(default, deserialize_with = "lenient_date")]
    pub as_of: Option<NaiveDate>,
}

impl Default for SettlementRequest {
    fn default() -> Self {
        Self {
            start_date: None,
            rental_amount: None,
            rental_basis: RentalBasis::default(),
            escalation_percent: Decimal::zero(),
            term_months: default_term(),
            as_of: None,
        }
    }
}

fn default_term() -> u32 {
    DEFAULT_TERM_MONTHS
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(MaybeDate)
}

/// `YYYY-MM-DD` strings parse; anything else is `None`.
struct MaybeDate;

impl<'de> Visitor<'de> for MaybeDate {
    type Value = Option<NaiveDate>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a YYYY-MM-DD date string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(MaybeDate)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

/// One contract year in the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearEntry {
    pub year: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: Decimal,
    pub months_remaining: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub total_settlement: Decimal,
    pub year_breakdown: Vec<YearEntry>,
}

/// Compute the settlement for a request, or `None` when the start date or
/// rental amount is missing. `as_of` applies unless the request carries its
/// own date.
pub fn compute_settlement(
    request: &SettlementRequest,
    as_of: NaiveDate,
) -> Option<SettlementResult> {
    let start_date = request.start_date?;
    let rental_amount = request.rental_amount?;
    Some(settle(
        start_date,
        rental_amount,
        request.rental_basis,
        request.escalation_percent,
        request.term_months,
        request.as_of.unwrap_or(as_of),
    ))
}

/// Year-by-year settlement walk. Terms beyond [`MAX_TERM_MONTHS`] are clamped.
pub fn settle(
    start_date: NaiveDate,
    rental_amount: Decimal,
    basis: RentalBasis,
    escalation_percent: Decimal,
    term_months: u32,
    as_of: NaiveDate,
) -> SettlementResult {
    let growth = Decimal::one() + escalation_percent.percent_as_fraction();
    let mut rental = rental_amount;

    if basis == RentalBasis::Current && growth.is_positive() {
        for _ in 0..completed_years(start_date, as_of) {
            rental = rental / growth;
        }
    }

    let years = term_months.min(MAX_TERM_MONTHS).div_ceil(MONTHS_PER_YEAR);
    let mut total = Decimal::zero();
    let mut breakdown = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let start = add_years(start_date, year - 1);
        let end = add_years(start_date, year);

        let (amount, months_remaining, completed) = if as_of >= end {
            (Decimal::zero(), 0, true)
        } else if as_of < start {
            (rental * Decimal::from(MONTHS_PER_YEAR), MONTHS_PER_YEAR, false)
        } else {
            let months = months_until(as_of, end);
            (rental * Decimal::from(months), months, false)
        };

        total += amount;
        breakdown.push(YearEntry {
            year,
            start_date: start,
            end_date: end,
            amount,
            months_remaining,
            completed,
        });
        rental *= growth;
    }

    SettlementResult {
        total_settlement: total,
        year_breakdown: breakdown,
    }
}

fn days_per_year() -> Decimal {
    Decimal::new(RustDecimal::new(36525, 2))
}

fn days_per_month() -> Decimal {
    Decimal::new(RustDecimal::new(3044, 2))
}

/// Whole years between two dates, using 365.25-day years.
fn completed_years(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = (to - from).num_days();
    if days <= 0 {
        return 0;
    }
    (Decimal::from(days) / days_per_year())
        .floor()
        .to_u32_exact()
        .unwrap_or(0)
}

/// Months left until `end`, rounding any part month up.
fn months_until(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = (to - from).num_days().max(0);
    (Decimal::from(days) / days_per_month())
        .ceil()
        .to_u32_exact()
        .unwrap_or(0)
}

/// Anniversary `years` after `date`; 29 February falls back to 28 February.
fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(years * MONTHS_PER_YEAR))
        .unwrap_or(NaiveDate::MAX)
}
