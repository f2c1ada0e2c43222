//! Range-banded rate tables ("sliding scales").
//!
//! A scale arrives on the wire as a map from a range label to a rate:
//! `{"0-4": 2500, "5-8": 3500, "33+": 7500}`. Labels are parsed once into
//! ordered [`RangeBand`]s and every lookup walks the bands in ascending order.
//!
//! Accepted label forms:
//! - `"min-max"`: closed range
//! - `"min+"`, `"min-+"`, `"min-Infinity"`: unbounded above
//!
//! `"100000+"` is the legacy spelling of the top finance band and always
//! means `[100001, ∞)`, whatever precedes it.
//!
//! Two boundary rules keep adjacent bands from double-matching or leaving
//! holes:
//! - a band whose lower bound equals the previous band's upper bound starts
//!   one unit higher (`"0-8"` + `"8-16"` behaves as `"0-8"` + `"9-16"`);
//! - a value that falls in the sub-unit gap between integer-labelled
//!   neighbours (`20000.5` between `"0-20000"` and `"20001-50000"`) belongs to
//!   the lower band.

use super::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("invalid range label '{0}'")]
    InvalidLabel(String),
    #[error("range '{0}' has a lower bound above its upper bound")]
    Inverted(String),
    #[error("ranges '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },
    #[error("rate for range '{0}' must not be negative")]
    NegativeRate(String),
}

/// One parsed range of a scale. `max == None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBand {
    pub label: String,
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

/// Lower bound written for the top band that actually starts one unit higher.
const LEGACY_TOP_BAND_FLOOR: u32 = 100_000;

/// Parse a range label into `(min, max)` bounds.
pub fn parse_range_label(label: &str) -> Result<(Decimal, Option<Decimal>), ScaleError> {
    let invalid = || ScaleError::InvalidLabel(label.to_string());
    let trimmed = label.trim();

    if let Some(head) = trimmed.strip_suffix('+') {
        let head = head.trim_end();
        let head = head.strip_suffix('-').unwrap_or(head);
        let min = parse_bound(head).ok_or_else(invalid)?;
        return Ok((unbounded_floor(min), None));
    }

    let (lo, hi) = trimmed.split_once('-').ok_or_else(invalid)?;
    let min = parse_bound(lo).ok_or_else(invalid)?;
    let hi = hi.trim();
    if hi.eq_ignore_ascii_case("infinity") || hi.eq_ignore_ascii_case("inf") {
        return Ok((unbounded_floor(min), None));
    }

    let max = parse_bound(hi).ok_or_else(invalid)?;
    if min > max {
        return Err(ScaleError::Inverted(label.to_string()));
    }
    Ok((min, Some(max)))
}

fn unbounded_floor(min: Decimal) -> Decimal {
    let legacy = Decimal::from(LEGACY_TOP_BAND_FLOOR);
    if min == legacy {
        legacy + Decimal::one()
    } else {
        min
    }
}

fn parse_bound(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str_canonical(raw)
        .ok()
        .filter(|value| !value.is_negative())
}

/// An ordered, non-overlapping set of bands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeScale {
    bands: Vec<RangeBand>,
}

impl RangeScale {
    /// Build a scale, rejecting bad labels, negative rates and overlaps.
    pub fn parse<I, S>(entries: I) -> Result<Self, ScaleError>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut bands = Vec::new();
        for (label, rate) in entries {
            let label = label.as_ref();
            let (min, max) = parse_range_label(label)?;
            if rate.is_negative() {
                return Err(ScaleError::NegativeRate(label.to_string()));
            }
            bands.push(RangeBand {
                label: label.to_string(),
                min,
                max,
                rate,
            });
        }

        let bands = normalize(bands);
        if let Some((first, second)) = first_overlap(&bands) {
            return Err(ScaleError::Overlap { first, second });
        }
        Ok(Self { bands })
    }

    /// Build a scale from data we do not control, skipping labels that do not
    /// parse. Overlaps are kept; the lowest matching band wins.
    pub fn parse_lenient<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut bands = Vec::new();
        for (label, rate) in entries {
            let label = label.as_ref();
            match parse_range_label(label) {
                Ok((min, max)) => bands.push(RangeBand {
                    label: label.to_string(),
                    min,
                    max,
                    rate,
                }),
                Err(e) => warn!(label = %label, error = %e, "Skipping unparseable scale range"),
            }
        }

        let bands = normalize(bands);
        if let Some((first, second)) = first_overlap(&bands) {
            warn!(first = %first, second = %second, "Scale ranges overlap, lowest range wins");
        }
        Self { bands }
    }

    pub fn bands(&self) -> &[RangeBand] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Find the band covering `value`.
    pub fn find_band(&self, value: Decimal) -> Option<&RangeBand> {
        for (i, band) in self.bands.iter().enumerate() {
            if value < band.min {
                return None;
            }
            let Some(max) = band.max else {
                return Some(band);
            };
            if value <= max {
                return Some(band);
            }
            if let Some(next) = self.bands.get(i + 1) {
                if value < next.min && next.min - max <= Decimal::one() {
                    return Some(band);
                }
            }
        }
        None
    }

    /// Rate of the band covering `value`.
    ///
    /// Returns None when nothing covers the value or the covering band's rate
    /// is zero; both mean the table has no usable entry for this input.
    pub fn lookup(&self, value: Decimal) -> Option<Decimal> {
        self.find_band(value)
            .map(|band| band.rate)
            .filter(|rate| !rate.is_zero())
    }

    /// Labels and rates in the shape they were supplied.
    pub fn to_wire(&self) -> BTreeMap<String, Decimal> {
        self.bands
            .iter()
            .map(|band| (band.label.clone(), band.rate))
            .collect()
    }
}

fn normalize(mut bands: Vec<RangeBand>) -> Vec<RangeBand> {
    bands.sort_by(|a, b| {
        a.min
            .cmp(&b.min)
            .then_with(|| match (a.max, b.max) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });

    for i in 1..bands.len() {
        if let Some(prev_max) = bands[i - 1].max {
            if bands[i].min == prev_max {
                bands[i].min = prev_max + Decimal::one();
            }
        }
    }
    bands
}

fn first_overlap(bands: &[RangeBand]) -> Option<(String, String)> {
    bands.windows(2).find_map(|pair| {
        let (prev, next) = (&pair[0], &pair[1]);
        let overlaps = match prev.max {
            None => true,
            Some(max) => next.min <= max || next.max.map_or(false, |m| m < next.min),
        };
        overlaps.then(|| (prev.label.clone(), next.label.clone()))
    })
}
