//! Totals computation for a quote.
//!
//! Every figure is derived from the previous ones in a fixed order, so the
//! function below reads top to bottom as the pricing sheet does. Missing
//! table entries never abort the computation: they price as zero and are
//! reported as [`DataGap`]s.

use crate::domain::{
    is_extension_item, section_total, DealDetails, Decimal, FactorKey, RateTables, Section,
    SectionId,
};
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// VAT charged on the monthly total (15%).
pub fn vat_rate() -> Decimal {
    Decimal::new(RustDecimal::new(15, 2))
}

/// Fully derived snapshot of a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResult {
    pub extensions: u32,
    pub hardware_total: Decimal,
    pub distance_cost: Decimal,
    pub extensions_cost: Decimal,
    pub sliding_scale_cost: Decimal,
    pub hardware_install_total: Decimal,
    pub base_gross_profit: Decimal,
    pub additional_profit: Decimal,
    pub total_gross_profit: Decimal,
    pub finance_fee: Decimal,
    pub settlement_amount: Decimal,
    pub finance_amount: Decimal,
    pub total_payout: Decimal,
    pub selected_factor: Decimal,
    pub hardware_rental: Decimal,
    pub connectivity_cost: Decimal,
    pub licensing_cost: Decimal,
    #[serde(rename = "totalMRC")]
    pub total_mrc: Decimal,
    pub total_ex_vat: Decimal,
    pub vat_amount: Decimal,
    pub total_inc_vat: Decimal,
}

/// A lookup that found nothing usable and was priced as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataGap {
    InstallationScale { extensions: u32 },
    GrossProfitScale { extensions: u32 },
    FinanceFeeScale { amount: Decimal },
    FactorTable { key: String },
    FactorBand { key: String, amount: Decimal },
}

impl std::fmt::Display for DataGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataGap::InstallationScale { extensions } => {
                write!(f, "No installation scale found for {} extensions", extensions)
            }
            DataGap::GrossProfitScale { extensions } => {
                write!(f, "No gross profit scale found for {} extensions", extensions)
            }
            DataGap::FinanceFeeScale { amount } => {
                write!(f, "No finance fee found for amount: {}", amount)
            }
            DataGap::FactorTable { key } => write!(f, "No factor found for key: {}", key),
            DataGap::FactorBand { key, amount } => write!(
                f,
                "No matching factor range in {} for finance amount: {}",
                key, amount
            ),
        }
    }
}

/// Totals plus the data gaps met while computing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub totals: TotalsResult,
    pub data_gaps: Vec<DataGap>,
}

/// Compute the totals for a quote.
pub fn compute_totals(sections: &[Section], deal: &DealDetails, rates: &RateTables) -> TotalsResult {
    compute_quote(sections, deal, rates).totals
}

/// Compute the totals and collect every table lookup that came back empty.
///
/// Each gap is also logged as a warning.
pub fn compute_quote(sections: &[Section], deal: &DealDetails, rates: &RateTables) -> Quote {
    let mut gaps = Vec::new();

    let extensions = count_extensions(sections);
    let extension_value = Decimal::from(extensions);
    let hardware_total = section_total(sections, SectionId::Hardware);

    let distance_cost = deal.distance_to_install * rates.additional_costs.cost_per_kilometer;
    let extensions_cost = extension_value * rates.additional_costs.cost_per_point;

    let sliding_scale_cost = if extensions > 0 {
        rates.installation.lookup(extension_value).unwrap_or_else(|| {
            gaps.push(DataGap::InstallationScale { extensions });
            Decimal::zero()
        })
    } else {
        Decimal::zero()
    };

    let hardware_install_total = hardware_total + distance_cost + extensions_cost + sliding_scale_cost;

    let base_gross_profit = if extensions > 0 {
        rates.gross_profit.lookup(extension_value).unwrap_or_else(|| {
            gaps.push(DataGap::GrossProfitScale { extensions });
            Decimal::zero()
        })
    } else {
        Decimal::zero()
    };

    let additional_profit = deal.additional_gross_profit;
    let total_gross_profit = base_gross_profit + additional_profit;
    let settlement_amount = deal.settlement;

    let pre_fee_amount = hardware_install_total + total_gross_profit + settlement_amount;
    let finance_fee = match rates.finance_fee.lookup(pre_fee_amount) {
        Some(rate) => fee_for_rate(rate, pre_fee_amount),
        None => {
            gaps.push(DataGap::FinanceFeeScale {
                amount: pre_fee_amount,
            });
            Decimal::zero()
        }
    };

    let finance_amount = pre_fee_amount + finance_fee;
    let total_payout = finance_amount;

    let selected_factor = select_factor(rates, deal.factor_key(), finance_amount, &mut gaps);
    let hardware_rental = if selected_factor.is_positive() {
        finance_amount * selected_factor
    } else {
        Decimal::zero()
    };

    let connectivity_cost = section_total(sections, SectionId::Connectivity);
    let licensing_cost = section_total(sections, SectionId::Licensing);
    let total_mrc = connectivity_cost + licensing_cost;

    let total_ex_vat = hardware_rental + total_mrc;
    let vat_amount = total_ex_vat * vat_rate();
    let total_inc_vat = total_ex_vat + vat_amount;

    for gap in &gaps {
        warn!(gap = ?gap, "{}", gap);
    }

    Quote {
        totals: TotalsResult {
            extensions,
            hardware_total,
            distance_cost,
            extensions_cost,
            sliding_scale_cost,
            hardware_install_total,
            base_gross_profit,
            additional_profit,
            total_gross_profit,
            finance_fee,
            settlement_amount,
            finance_amount,
            total_payout,
            selected_factor,
            hardware_rental,
            connectivity_cost,
            licensing_cost,
            total_mrc,
            total_ex_vat,
            vat_amount,
            total_inc_vat,
        },
        data_gaps: gaps,
    }
}

/// Σ quantity of extension SKUs in the hardware section.
pub fn count_extensions(sections: &[Section]) -> u32 {
    crate::domain::find_section(sections, SectionId::Hardware)
        .map(|hardware| {
            hardware
                .items
                .iter()
                .filter(|item| is_extension_item(&item.id))
                .fold(0u32, |sum, item| sum.saturating_add(item.quantity))
        })
        .unwrap_or(0)
}

/// A finance-fee rate below one is a fraction of the amount; otherwise it is
/// the fee itself.
pub fn fee_for_rate(rate: Decimal, amount: Decimal) -> Decimal {
    if rate < Decimal::one() {
        amount * rate
    } else {
        rate
    }
}

fn select_factor(
    rates: &RateTables,
    key: FactorKey,
    finance_amount: Decimal,
    gaps: &mut Vec<DataGap>,
) -> Decimal {
    let Some(scale) = rates.factors.get(&key) else {
        gaps.push(DataGap::FactorTable {
            key: key.to_string(),
        });
        return Decimal::zero();
    };

    scale.lookup(finance_amount).unwrap_or_else(|| {
        gaps.push(DataGap::FactorBand {
            key: key.to_string(),
            amount: finance_amount,
        });
        Decimal::zero()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineItem, RangeScale};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn scale(entries: &[(&str, &str)]) -> RangeScale {
        RangeScale::parse(entries.iter().map(|(l, r)| (*l, d(r)))).unwrap()
    }

    #[test]
    fn test_vat_rate_is_fifteen_percent() {
        assert_eq!(vat_rate(), d("0.15"));
        assert_eq!(d("1000") * vat_rate(), d("150"));
    }

    #[test]
    fn test_fee_for_rate() {
        assert_eq!(fee_for_rate(d("0.01"), d("15000")), d("150"));
        assert_eq!(fee_for_rate(d("750"), d("15000")), d("750"));
        assert_eq!(fee_for_rate(d("1"), d("15000")), d("1"));
    }

    #[test]
    fn test_count_extensions_ignores_other_items() {
        let sections = vec![
            Section::new(
                SectionId::Hardware,
                vec![
                    LineItem::new("yealink-t31p", "T31P", d("808.96")).with_quantity(3),
                    LineItem::new("session-abc", "Custom", d("10")).with_quantity(50),
                    LineItem::new("mobile-app", "App", d("0")).with_quantity(2),
                ],
            ),
            Section::new(
                SectionId::Connectivity,
                vec![LineItem::new("switchboard", "Not hardware", d("1")).with_quantity(9)],
            ),
        ];
        assert_eq!(count_extensions(&sections), 5);
        assert_eq!(count_extensions(&[]), 0);
    }

    #[test]
    fn test_empty_inputs_produce_all_zero_totals() {
        let quote = compute_quote(&[], &DealDetails::default(), &RateTables::default());
        assert_eq!(quote.totals, TotalsResult::default());
        // Empty fee scale and missing factor key are reported, not fatal.
        assert_eq!(
            quote.data_gaps,
            vec![
                DataGap::FinanceFeeScale {
                    amount: Decimal::zero()
                },
                DataGap::FactorTable {
                    key: "60-0".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_zero_factor_means_no_rental() {
        let mut rates = RateTables::default();
        rates
            .factors
            .insert("60-0".parse().unwrap(), scale(&[("0-20000", "0")]));
        let sections = vec![Section::new(
            SectionId::Hardware,
            vec![LineItem::new("x", "X", d("1000")).with_quantity(1)],
        )];

        let quote = compute_quote(&sections, &DealDetails::default(), &rates);
        assert_eq!(quote.totals.selected_factor, Decimal::zero());
        assert_eq!(quote.totals.hardware_rental, Decimal::zero());
        assert!(quote.data_gaps.contains(&DataGap::FactorBand {
            key: "60-0".to_string(),
            amount: d("1000")
        }));
    }

    #[test]
    fn test_totals_serialize_with_camel_case_field_names() {
        let json = serde_json::to_value(TotalsResult::default()).unwrap();
        for field in [
            "extensions",
            "hardwareTotal",
            "slidingScaleCost",
            "hardwareInstallTotal",
            "totalMRC",
            "totalExVat",
            "vatAmount",
            "totalIncVat",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_data_gap_messages() {
        let gap = DataGap::InstallationScale { extensions: 60 };
        assert_eq!(gap.to_string(), "No installation scale found for 60 extensions");
        let json = serde_json::to_value(&gap).unwrap();
        assert_eq!(json["kind"], "installationScale");
        assert_eq!(json["extensions"], 60);
    }
}
