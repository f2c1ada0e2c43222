use deal_calculator::domain::{
    AdditionalCosts, DealDetails, Decimal, FactorKey, FactorTable, LineItem, RangeScale,
    RateTables, Section, SectionId,
};
use deal_calculator::engine::{compute_quote, compute_totals, DataGap};
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn scale(entries: &[(&str, &str)]) -> RangeScale {
    RangeScale::parse(entries.iter().map(|(label, rate)| (*label, d(rate)))).unwrap()
}

/// Six extensions priced at zero plus R10 000 of other hardware.
fn scenario_sections() -> Vec<Section> {
    vec![
        Section::new(
            SectionId::Hardware,
            vec![
                LineItem::new("mobile-app", "Additional Mobile App", d("0")).with_quantity(6),
                LineItem::new("additional-hardware", "Additional Hardware", d("10000"))
                    .with_quantity(1),
            ],
        ),
        Section::new(SectionId::Connectivity, vec![]),
        Section::new(SectionId::Licensing, vec![]),
    ]
}

fn scenario_rates() -> RateTables {
    let mut factors = FactorTable::new();
    factors.insert(
        FactorKey::new(60, Decimal::zero()),
        scale(&[("0-20000", "0.025")]),
    );
    RateTables {
        installation: scale(&[("0-4", "250"), ("5-8", "500")]),
        gross_profit: scale(&[("0-4", "1000"), ("5-8", "2000")]),
        finance_fee: scale(&[("0-20000", "0.01")]),
        factors,
        additional_costs: AdditionalCosts {
            cost_per_kilometer: d("15"),
            cost_per_point: d("250"),
        },
    }
}

fn scenario_deal() -> DealDetails {
    DealDetails {
        distance_to_install: d("20"),
        settlement: d("700"),
        ..DealDetails::default()
    }
}

#[test]
fn test_installation_scenario() {
    let totals = compute_totals(&scenario_sections(), &scenario_deal(), &scenario_rates());

    assert_eq!(totals.extensions, 6);
    assert_eq!(totals.hardware_total, d("10000"));
    assert_eq!(totals.distance_cost, d("300"));
    assert_eq!(totals.extensions_cost, d("1500"));
    assert_eq!(totals.sliding_scale_cost, d("500"));
    assert_eq!(totals.hardware_install_total, d("12300"));
    assert_eq!(totals.base_gross_profit, d("2000"));
    assert_eq!(totals.total_gross_profit, d("2000"));
}

#[test]
fn test_finance_fee_and_rental_scenario() {
    let quote = compute_quote(&scenario_sections(), &scenario_deal(), &scenario_rates());
    let totals = quote.totals;

    // 12300 + 2000 + 700 settlement = 15000 before the fee.
    assert_eq!(totals.finance_fee, d("150"));
    assert_eq!(totals.finance_amount, d("15150"));
    assert_eq!(totals.total_payout, d("15150"));
    assert_eq!(totals.selected_factor, d("0.025"));
    assert_eq!(totals.hardware_rental, d("378.75"));
    assert_eq!(totals.total_ex_vat, d("378.75"));
    assert_eq!(totals.vat_amount, d("56.8125"));
    assert_eq!(totals.total_inc_vat, d("435.5625"));
    assert!(quote.data_gaps.is_empty());
}

#[test]
fn test_derived_totals_are_exact_sums() {
    let mut sections = scenario_sections();
    sections[1]
        .items
        .push(LineItem::new("fiber-line", "Fiber Line", d("699")).with_quantity(2));
    sections[2]
        .items
        .push(LineItem::new("premium-license", "Premium License", d("89.99")).with_quantity(7));
    let deal = DealDetails {
        additional_gross_profit: d("333.33"),
        ..scenario_deal()
    };

    let t = compute_totals(&sections, &deal, &scenario_rates());

    assert_eq!(
        t.hardware_install_total,
        t.hardware_total + t.distance_cost + t.extensions_cost + t.sliding_scale_cost
    );
    assert_eq!(t.total_gross_profit, t.base_gross_profit + d("333.33"));
    assert_eq!(
        t.finance_amount,
        t.hardware_install_total + t.total_gross_profit + t.settlement_amount + t.finance_fee
    );
    assert_eq!(t.total_mrc, d("1398") + d("629.93"));
    assert_eq!(t.total_ex_vat, t.hardware_rental + t.total_mrc);
    assert_eq!(t.total_inc_vat, t.total_ex_vat * d("1.15"));
}

#[test]
fn test_zero_quantities_price_nothing() {
    let sections = vec![
        Section::new(
            SectionId::Hardware,
            vec![LineItem::new("yealink-t31p", "T31P", d("808.96"))],
        ),
        Section::new(
            SectionId::Connectivity,
            vec![LineItem::new("lte", "LTE", d("489"))],
        ),
        Section::new(
            SectionId::Licensing,
            vec![LineItem::new("premium", "Premium", d("89"))],
        ),
    ];

    let totals = compute_totals(&sections, &DealDetails::default(), &scenario_rates());
    assert_eq!(totals.hardware_total, Decimal::zero());
    assert_eq!(totals.connectivity_cost, Decimal::zero());
    assert_eq!(totals.licensing_cost, Decimal::zero());
}

#[test]
fn test_non_extension_items_do_not_change_extension_count() {
    let mut sections = scenario_sections();
    let before = compute_totals(&sections, &scenario_deal(), &scenario_rates()).extensions;

    sections[0]
        .items
        .push(LineItem::new("session-1234", "Cable run", d("50")).with_quantity(40));
    let after = compute_totals(&sections, &scenario_deal(), &scenario_rates()).extensions;

    assert_eq!(before, after);
}

#[test]
fn test_zero_extensions_skip_scale_lookups() {
    let sections = vec![Section::new(
        SectionId::Hardware,
        vec![LineItem::new("additional-hardware", "Extra", d("1000")).with_quantity(1)],
    )];
    let rates = RateTables {
        installation: scale(&[("5-8", "500")]),
        ..scenario_rates()
    };

    let quote = compute_quote(&sections, &DealDetails::default(), &rates);
    assert_eq!(quote.totals.extensions, 0);
    assert_eq!(quote.totals.sliding_scale_cost, Decimal::zero());
    assert_eq!(quote.totals.base_gross_profit, Decimal::zero());
    assert!(!quote
        .data_gaps
        .iter()
        .any(|gap| matches!(gap, DataGap::InstallationScale { .. })));
}

#[test]
fn test_unmatched_extension_count_is_reported() {
    let sections = vec![Section::new(
        SectionId::Hardware,
        vec![LineItem::new("desktop-phone", "Desktop Phone", d("1200")).with_quantity(60)],
    )];

    let quote = compute_quote(&sections, &DealDetails::default(), &scenario_rates());
    assert_eq!(quote.totals.sliding_scale_cost, Decimal::zero());
    assert!(quote
        .data_gaps
        .contains(&DataGap::InstallationScale { extensions: 60 }));
    assert!(quote
        .data_gaps
        .contains(&DataGap::GrossProfitScale { extensions: 60 }));
}

#[test]
fn test_boundaries_select_exactly_one_band() {
    let scale = scale(&[
        ("0-20000", "750"),
        ("20001-50000", "1500"),
        ("50001-100000", "2500"),
        ("100000+", "3500"),
    ]);

    assert_eq!(scale.lookup(d("20000")), Some(d("750")));
    assert_eq!(scale.lookup(d("20001")), Some(d("1500")));
    assert_eq!(scale.lookup(d("100000")), Some(d("2500")));
    assert_eq!(scale.lookup(d("100001")), Some(d("3500")));
}

#[test]
fn test_legacy_top_fee_band_excludes_100000() {
    // Hardware alone makes up the whole pre-fee amount.
    let sections = vec![Section::new(
        SectionId::Hardware,
        vec![LineItem::new("additional-hardware", "Extra", d("100000")).with_quantity(1)],
    )];
    let rates = RateTables {
        finance_fee: scale(&[("0-20000", "750"), ("100000+", "3500")]),
        ..scenario_rates()
    };

    let quote = compute_quote(&sections, &DealDetails::default(), &rates);
    assert_eq!(quote.totals.finance_fee, Decimal::zero());
    assert!(quote.data_gaps.contains(&DataGap::FinanceFeeScale {
        amount: d("100000")
    }));

    let sections = vec![Section::new(
        SectionId::Hardware,
        vec![LineItem::new("additional-hardware", "Extra", d("100001")).with_quantity(1)],
    )];
    let quote = compute_quote(&sections, &DealDetails::default(), &rates);
    assert_eq!(quote.totals.finance_fee, d("3500"));
}

#[test]
fn test_unbounded_spellings_match_large_amounts() {
    for label in ["100001+", "100001-Infinity", "100001-+"] {
        let scale = scale(&[("0-100000", "0.02"), (label, "0.01")]);
        assert_eq!(scale.lookup(d("999999999")), Some(d("0.01")), "label {label}");
    }
}

#[test]
fn test_missing_factor_key_prices_no_rental() {
    let deal = DealDetails {
        term: 36,
        escalation: d("15"),
        ..scenario_deal()
    };
    let quote = compute_quote(&scenario_sections(), &deal, &scenario_rates());

    assert_eq!(quote.totals.selected_factor, Decimal::zero());
    assert_eq!(quote.totals.hardware_rental, Decimal::zero());
    assert!(quote.data_gaps.contains(&DataGap::FactorTable {
        key: "36-15".to_string()
    }));
}

#[test]
fn test_repeated_computation_is_deterministic() {
    let sections = scenario_sections();
    let deal = scenario_deal();
    let rates = scenario_rates();
    assert_eq!(
        compute_quote(&sections, &deal, &rates),
        compute_quote(&sections, &deal, &rates)
    );
}
