//! Amortization factor sheet.
//!
//! The admin API serves factors grouped by term and escalation:
//! `{"60_months": {"10%": {"0-20000": 0.02816, "100000+": 0.02486}}}`.
//! The engine addresses them by a composite `"<term>-<escalation>"` key
//! (`"60-10"`), each pointing at a [`RangeScale`] over finance-amount bands.

use super::scale::{RangeScale, ScaleError};
use super::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Wire form: term key -> escalation key -> range label -> factor.
pub type FactorSheet = BTreeMap<String, BTreeMap<String, BTreeMap<String, Decimal>>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorError {
    #[error("invalid term key '{0}'")]
    InvalidTerm(String),
    #[error("invalid escalation key '{0}'")]
    InvalidEscalation(String),
    #[error("invalid factor key '{0}'")]
    InvalidKey(String),
    #[error("factors for {key}: {source}")]
    Scale {
        key: FactorKey,
        #[source]
        source: ScaleError,
    },
}

/// Term (months) and escalation (percent per annum) selecting one factor scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactorKey {
    term_months: u32,
    escalation: Decimal,
}

impl FactorKey {
    pub fn new(term_months: u32, escalation: Decimal) -> Self {
        Self {
            term_months,
            escalation: Decimal::new(escalation.inner().normalize()),
        }
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn escalation(&self) -> Decimal {
        self.escalation
    }

    /// Parse the wire pair (`"36_months"`, `"10%"`).
    pub fn from_wire(term: &str, escalation: &str) -> Result<Self, FactorError> {
        let term_months = term
            .trim()
            .split('_')
            .next()
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or_else(|| FactorError::InvalidTerm(term.to_string()))?;

        let escalation_value = escalation.trim();
        let escalation_value = escalation_value
            .strip_suffix('%')
            .unwrap_or(escalation_value);
        let escalation_value = Decimal::from_str_canonical(escalation_value)
            .ok()
            .filter(|e| !e.is_negative())
            .ok_or_else(|| FactorError::InvalidEscalation(escalation.to_string()))?;

        Ok(Self::new(term_months, escalation_value))
    }

    pub fn wire_term(&self) -> String {
        format!("{}_months", self.term_months)
    }

    pub fn wire_escalation(&self) -> String {
        format!("{}%", self.escalation)
    }
}

impl fmt::Display for FactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.term_months, self.escalation)
    }
}

impl FromStr for FactorKey {
    type Err = FactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FactorError::InvalidKey(s.to_string());
        let (term, escalation) = s.trim().split_once('-').ok_or_else(invalid)?;
        let term_months = term.trim().parse::<u32>().map_err(|_| invalid())?;
        let escalation = Decimal::from_str_canonical(escalation).map_err(|_| invalid())?;
        if escalation.is_negative() {
            return Err(invalid());
        }
        Ok(Self::new(term_months, escalation))
    }
}

/// Factor scales keyed by term and escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactorTable {
    scales: BTreeMap<FactorKey, RangeScale>,
}

impl FactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FactorKey, scale: RangeScale) {
        self.scales.insert(key, scale);
    }

    pub fn get(&self, key: &FactorKey) -> Option<&RangeScale> {
        self.scales.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FactorKey> {
        self.scales.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactorKey, &RangeScale)> {
        self.scales.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    /// Parse the admin wire form, rejecting any malformed key or range.
    pub fn from_wire(sheet: &FactorSheet) -> Result<Self, FactorError> {
        let mut table = Self::new();
        for (term, by_escalation) in sheet {
            for (escalation, ranges) in by_escalation {
                let key = FactorKey::from_wire(term, escalation)?;
                let scale = RangeScale::parse(ranges.iter().map(|(l, f)| (l.as_str(), *f)))
                    .map_err(|source| FactorError::Scale { key, source })?;
                table.insert(key, scale);
            }
        }
        Ok(table)
    }

    /// Parse the wire form from an untrusted source, skipping what does not parse.
    pub fn from_wire_lenient(sheet: &FactorSheet) -> Self {
        let mut table = Self::new();
        for (term, by_escalation) in sheet {
            for (escalation, ranges) in by_escalation {
                match FactorKey::from_wire(term, escalation) {
                    Ok(key) => {
                        let scale =
                            RangeScale::parse_lenient(ranges.iter().map(|(l, f)| (l.as_str(), *f)));
                        table.insert(key, scale);
                    }
                    Err(e) => warn!(
                        term = %term,
                        escalation = %escalation,
                        error = %e,
                        "Skipping factor scale"
                    ),
                }
            }
        }
        table
    }

    pub fn to_wire(&self) -> FactorSheet {
        let mut sheet = FactorSheet::new();
        for (key, scale) in &self.scales {
            sheet
                .entry(key.wire_term())
                .or_default()
                .insert(key.wire_escalation(), scale.to_wire());
        }
        sheet
    }
}
