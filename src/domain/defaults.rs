//! Built-in catalogue and rate data.
//!
//! `fallback_sections` is what a quoting client prices against when the
//! admin tables cannot be fetched. The `seed_*` data populates an empty
//! pricing store.

use super::catalogue::{LineItem, Section, SectionId};
use super::factors::FactorSheet;
use super::rates::{AdditionalCosts, ScalesPayload};
use super::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(label, value)| (label.to_string(), d(value)))
        .collect()
}

/// Catalogue used when the admin tables are unavailable.
pub fn fallback_sections() -> Vec<Section> {
    vec![
        Section::new(
            SectionId::Hardware,
            vec![
                LineItem::new("yealink-t31p", "Yealink T31P (B&W desk- excludes PSU)", d("808.96")).locked(),
                LineItem::new("yealink-t34w", "Yealink T34W (Colour desk- includes PSU)", d("1213.44")).locked(),
                LineItem::new("yealink-t43u", "Yealink T43U Switchboard (B&W- excludes PSU)", d("1693.76")).locked(),
                LineItem::new("yealink-t44u", "Yealink T44U Switchboard (Colour- excludes PSU)", d("1693.76")).locked(),
                LineItem::new("yealink-w73p", "Yealink W73P Cordless (Handset & base)", d("1820.16")).locked(),
                LineItem::new("yealink-w73h", "Yealink W73H (Handset only)", d("1137.60")).locked(),
                LineItem::new("mobile-app", "Additional Mobile App", d("0")).locked(),
            ],
        ),
        Section::new(
            SectionId::Connectivity,
            vec![
                LineItem::new("lte", "LTE", d("0")),
                LineItem::new("router", "Router", d("0")),
            ],
        ),
        Section::new(
            SectionId::Licensing,
            vec![
                LineItem::new("premium", "Premium", d("0")),
                LineItem::new("standard", "Standard", d("0")),
            ],
        ),
    ]
}

pub fn seed_sections() -> Vec<Section> {
    vec![
        Section::new(
            SectionId::Hardware,
            vec![
                LineItem::new("switchboard", "Switchboard", d("3000")).locked(),
                LineItem::new("desktop-phone", "Desktop Phone", d("1200")).locked(),
                LineItem::new("cordless-phone", "Cordless Phone", d("1500")).locked(),
                LineItem::new("mobile-apps", "Mobile Apps", d("500")).locked(),
                LineItem::new("additional-hardware", "Additional Hardware", d("2000")),
            ],
        ),
        Section::new(
            SectionId::Connectivity,
            vec![
                LineItem::new("vodacom-lte", "Vodacom LTE", d("489")),
                LineItem::new("fiber-line", "Fiber Line", d("699")),
            ],
        ),
        Section::new(
            SectionId::Licensing,
            vec![
                LineItem::new("basic-license", "Basic License", d("49")),
                LineItem::new("premium-license", "Premium License", d("89")),
            ],
        ),
    ]
}

pub fn seed_scales() -> ScalesPayload {
    ScalesPayload {
        installation: table(&[
            ("0-4", "2500"),
            ("5-8", "3500"),
            ("9-16", "4500"),
            ("17-32", "6000"),
            ("33+", "7500"),
        ]),
        finance_fee: table(&[("0-20000", "750"), ("20001-50000", "1500"), ("50001+", "2500")]),
        gross_profit: table(&[
            ("0-4", "15"),
            ("5-8", "20"),
            ("9-16", "25"),
            ("17-32", "30"),
            ("33+", "35"),
        ]),
        additional_costs: Some(AdditionalCosts::default()),
    }
}

/// 36/48/60-month factors at 0/10/15% escalation.
pub fn seed_factor_sheet() -> FactorSheet {
    const FACTORS: [(&str, &str, [&str; 4]); 9] = [
        ("36_months", "0%", ["0.03891", "0.03761", "0.03641", "0.03561"]),
        ("36_months", "10%", ["0.04012", "0.03882", "0.03762", "0.03682"]),
        ("36_months", "15%", ["0.04133", "0.04003", "0.03883", "0.03803"]),
        ("48_months", "0%", ["0.03133", "0.03003", "0.02883", "0.02803"]),
        ("48_months", "10%", ["0.03254", "0.03124", "0.03004", "0.02924"]),
        ("48_months", "15%", ["0.03375", "0.03245", "0.03125", "0.03045"]),
        ("60_months", "0%", ["0.02695", "0.02565", "0.02445", "0.02365"]),
        ("60_months", "10%", ["0.02816", "0.02686", "0.02566", "0.02486"]),
        ("60_months", "15%", ["0.02937", "0.02807", "0.02687", "0.02607"]),
    ];
    const BANDS: [&str; 4] = ["0-20000", "20001-50000", "50001-100000", "100000+"];

    let mut sheet = FactorSheet::new();
    for (term, escalation, factors) in FACTORS {
        let ranges = BANDS
            .iter()
            .zip(factors)
            .map(|(band, factor)| (band.to_string(), d(factor)))
            .collect();
        sheet
            .entry(term.to_string())
            .or_default()
            .insert(escalation.to_string(), ranges);
    }
    sheet
}
