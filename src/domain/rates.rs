//! Rate tables consumed by the pricing engine.

use super::factors::FactorTable;
use super::scale::{RangeScale, ScaleError};
use super::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-unit installation costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCosts {
    #[serde(default = "AdditionalCosts::default_cost_per_kilometer")]
    pub cost_per_kilometer: Decimal,
    #[serde(default = "AdditionalCosts::default_cost_per_point")]
    pub cost_per_point: Decimal,
}

impl AdditionalCosts {
    fn default_cost_per_kilometer() -> Decimal {
        Decimal::from(15u32)
    }

    fn default_cost_per_point() -> Decimal {
        Decimal::from(250u32)
    }
}

impl Default for AdditionalCosts {
    fn default() -> Self {
        Self {
            cost_per_kilometer: Self::default_cost_per_kilometer(),
            cost_per_point: Self::default_cost_per_point(),
        }
    }
}

/// Wire form of the scales endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalesPayload {
    #[serde(default)]
    pub installation: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub finance_fee: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub gross_profit: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_costs: Option<AdditionalCosts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalesError {
    #[error("{scale} scale: {source}")]
    Scale {
        scale: &'static str,
        #[source]
        source: ScaleError,
    },
    #[error("additional costs must not be negative")]
    NegativeAdditionalCost,
}

/// The three sliding scales plus the per-unit costs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleSet {
    pub installation: RangeScale,
    pub gross_profit: RangeScale,
    pub finance_fee: RangeScale,
    pub additional_costs: AdditionalCosts,
}

impl ScaleSet {
    /// Validate an admin edit.
    pub fn from_payload(payload: &ScalesPayload) -> Result<Self, ScalesError> {
        let parse = |scale: &'static str, entries: &BTreeMap<String, Decimal>| {
            RangeScale::parse(entries.iter().map(|(l, r)| (l.as_str(), *r)))
                .map_err(|source| ScalesError::Scale { scale, source })
        };

        let additional_costs = payload.additional_costs.unwrap_or_default();
        if additional_costs.cost_per_kilometer.is_negative()
            || additional_costs.cost_per_point.is_negative()
        {
            return Err(ScalesError::NegativeAdditionalCost);
        }

        Ok(Self {
            installation: parse("installation", &payload.installation)?,
            gross_profit: parse("gross_profit", &payload.gross_profit)?,
            finance_fee: parse("finance_fee", &payload.finance_fee)?,
            additional_costs,
        })
    }

    /// Accept whatever parses from a source we do not control.
    pub fn from_payload_lenient(payload: &ScalesPayload) -> Self {
        let parse = |entries: &BTreeMap<String, Decimal>| {
            RangeScale::parse_lenient(entries.iter().map(|(l, r)| (l.as_str(), *r)))
        };

        Self {
            installation: parse(&payload.installation),
            gross_profit: parse(&payload.gross_profit),
            finance_fee: parse(&payload.finance_fee),
            additional_costs: payload.additional_costs.unwrap_or_default(),
        }
    }

    pub fn to_payload(&self) -> ScalesPayload {
        ScalesPayload {
            installation: self.installation.to_wire(),
            finance_fee: self.finance_fee.to_wire(),
            gross_profit: self.gross_profit.to_wire(),
            additional_costs: Some(self.additional_costs),
        }
    }
}

/// Everything the engine needs besides the catalogue and the deal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTables {
    pub installation: RangeScale,
    pub gross_profit: RangeScale,
    pub finance_fee: RangeScale,
    pub factors: FactorTable,
    pub additional_costs: AdditionalCosts,
}

impl RateTables {
    pub fn new(scales: ScaleSet, factors: FactorTable) -> Self {
        Self {
            installation: scales.installation,
            gross_profit: scales.gross_profit,
            finance_fee: scales.finance_fee,
            factors,
            additional_costs: scales.additional_costs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_additional_costs_default_when_absent() {
        let payload: ScalesPayload = serde_json::from_str(r#"{"installation": {"0-4": 2500}}"#).unwrap();
        let scales = ScaleSet::from_payload(&payload).unwrap();
        assert_eq!(scales.additional_costs.cost_per_kilometer, d("15"));
        assert_eq!(scales.additional_costs.cost_per_point, d("250"));
        assert!(scales.finance_fee.is_empty());
    }

    #[test]
    fn test_additional_costs_partial_object_fills_defaults() {
        let costs: AdditionalCosts = serde_json::from_str(r#"{"cost_per_kilometer": 20}"#).unwrap();
        assert_eq!(costs.cost_per_kilometer, d("20"));
        assert_eq!(costs.cost_per_point, d("250"));
    }

    #[test]
    fn test_from_payload_names_the_failing_scale() {
        let payload: ScalesPayload =
            serde_json::from_str(r#"{"gross_profit": {"0-4": 15, "four-eight": 20}}"#).unwrap();
        match ScaleSet::from_payload(&payload) {
            Err(ScalesError::Scale { scale, .. }) => assert_eq!(scale, "gross_profit"),
            other => panic!("expected scale error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_payload_rejects_negative_costs() {
        let payload: ScalesPayload = serde_json::from_str(
            r#"{"additional_costs": {"cost_per_kilometer": -1, "cost_per_point": 250}}"#,
        )
        .unwrap();
        assert_eq!(
            ScaleSet::from_payload(&payload),
            Err(ScalesError::NegativeAdditionalCost)
        );
    }

    #[test]
    fn test_payload_roundtrip_keeps_labels() {
        let payload: ScalesPayload = serde_json::from_str(
            r#"{
                "installation": {"0-4": 2500, "33+": 7500},
                "finance_fee": {"0-20000": 750, "50001+": 2500},
                "gross_profit": {"0-4": 15},
                "additional_costs": {"cost_per_kilometer": 15, "cost_per_point": 250}
            }"#,
        )
        .unwrap();
        let scales = ScaleSet::from_payload(&payload).unwrap();
        assert_eq!(scales.to_payload(), payload);
    }
}
