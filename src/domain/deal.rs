//! Deal parameters entered for a quote.

use super::decimal::lenient;
use super::factors::FactorKey;
use super::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TERM_MONTHS: u32 = 60;

/// Per-quote parameters. Numeric fields coerce unusable input to zero; a
/// missing field takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealDetails {
    pub customer_name: String,
    #[serde(deserialize_with = "lenient::decimal")]
    pub distance_to_install: Decimal,
    #[serde(deserialize_with = "lenient::quantity")]
    pub term: u32,
    #[serde(deserialize_with = "lenient::decimal")]
    pub escalation: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub additional_gross_profit: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub settlement: Decimal,
}

impl Default for DealDetails {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            distance_to_install: Decimal::zero(),
            term: DEFAULT_TERM_MONTHS,
            escalation: Decimal::zero(),
            additional_gross_profit: Decimal::zero(),
            settlement: Decimal::zero(),
        }
    }
}

impl DealDetails {
    /// Key into the factor sheet for this deal's term and escalation.
    pub fn factor_key(&self) -> FactorKey {
        FactorKey::new(self.term, self.escalation)
    }

    pub fn apply(&mut self, patch: DealDetailsPatch) {
        if let Some(customer_name) = patch.customer_name {
            self.customer_name = customer_name;
        }
        if let Some(distance) = patch.distance_to_install {
            self.distance_to_install = distance;
        }
        if let Some(term) = patch.term {
            self.term = term;
        }
        if let Some(escalation) = patch.escalation {
            self.escalation = escalation;
        }
        if let Some(additional) = patch.additional_gross_profit {
            self.additional_gross_profit = additional;
        }
        if let Some(settlement) = patch.settlement {
            self.settlement = settlement;
        }
    }
}

/// Partial update of [`DealDetails`]; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDetailsPatch {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub distance_to_install: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::optional_quantity")]
    pub term: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub escalation: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub additional_gross_profit: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub settlement: Option<Decimal>,
}
