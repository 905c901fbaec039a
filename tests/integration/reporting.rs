//! ROI and resolution reporting over a settled ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use propsettle::engine::accountant::{Accountant, DateRange, PerformanceSummary};
use propsettle::engine::resolver::{resolution_summary, Ledger, ResolutionMode};
use propsettle::names::InMemoryNameRepository;
use propsettle::types::{MarketType, Outcome};

use crate::common::{self, engine, final_box_scores, run, slate_date};

fn settled() -> (propsettle::engine::resolver::ResolutionEngine, Ledger) {
    let engine = engine(Arc::new(InMemoryNameRepository::new()));
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();
    run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
    (engine, ledger)
}

fn totals(groups: &[PerformanceSummary]) -> (usize, Decimal, Decimal) {
    groups.iter().fold((0, Decimal::ZERO, Decimal::ZERO), |(n, staked, net), s| {
        (n + s.count, staked + s.total_staked, net + s.net_profit)
    })
}

#[test]
fn test_overall_roi() {
    let (engine, ledger) = settled();
    let report = Accountant::summarize(ledger.values(), DateRange::default(), engine.pricing());
    let o = &report.overall;

    assert_eq!(o.count, 7);
    assert_eq!((o.wins, o.losses, o.pushes, o.unresolved), (3, 2, 1, 1));
    // 100 × 5 + 50; the open $15 wager is not staked.
    assert_eq!(o.total_staked, dec!(550));
    // 150 − 100 + 90.91 − 50 + 0 + 110
    assert_eq!(o.net_profit, dec!(200.91));
    let roi = o.roi_percent.unwrap();
    assert!((roi - dec!(36.529)).abs() < dec!(0.001));
    assert_eq!(o.win_rate, Some(dec!(50)));
}

#[test]
fn test_breakdowns_reconcile_with_overall() {
    let (engine, ledger) = settled();
    let report = Accountant::summarize(ledger.values(), DateRange::default(), engine.pricing());
    let overall = (report.overall.count, report.overall.total_staked, report.overall.net_profit);

    assert_eq!(totals(&report.by_ev_tier), overall);
    assert_eq!(totals(&report.by_stake_tier), overall);
    assert_eq!(totals(&report.by_market), overall);
    assert_eq!(report.by_ev_tier.len(), 5);
}

#[test]
fn test_tier_d_uses_derived_tier() {
    let (engine, ledger) = settled();
    let report = Accountant::summarize(ledger.values(), DateRange::default(), engine.pricing());
    let d = report.by_ev_tier.iter().find(|s| s.label == "Tier D").unwrap();

    // Soto (derived from fair probability) and Ohtani, both losses.
    assert_eq!(d.count, 2);
    assert_eq!(d.total_staked, dec!(150));
    assert_eq!(d.net_profit, dec!(-150));
    assert_eq!(d.roi_percent, Some(dec!(-100)));
}

#[test]
fn test_date_range_excludes_other_days() {
    let (engine, ledger) = settled();
    let next_day = NaiveDate::from_ymd_opt(2025, 6, 27).unwrap();

    let report = Accountant::summarize(
        ledger.values(),
        DateRange::new(Some(next_day), None),
        engine.pricing(),
    );
    assert_eq!(report.overall.count, 0);
    assert_eq!(report.overall.roi_percent, None);

    let report = Accountant::summarize(
        ledger.values(),
        DateRange::new(Some(slate_date()), Some(slate_date())),
        engine.pricing(),
    );
    assert_eq!(report.overall.count, 7);
}

#[test]
fn test_resolution_summary_counts() {
    let (engine, mut ledger) = settled();

    let nobody = ledger["nobody"].wager.clone();
    engine
        .settle_manually(&nobody, Outcome::Loss, None, None, &mut ledger)
        .unwrap();

    let summary = resolution_summary(ledger.values(), Some(slate_date()));
    assert_eq!(summary.total_resolved, 7);
    assert_eq!(summary.auto_resolved, 6);
    assert_eq!(summary.manual_resolved, 1);
    assert_eq!(summary.needs_review, 0);
    assert!(summary.average_confidence.unwrap() > 0.9);
    assert!(summary
        .market_breakdown
        .iter()
        .any(|m| m.market == MarketType::InningsPitched && m.count == 1));

    let other_day = resolution_summary(ledger.values(), NaiveDate::from_ymd_opt(2025, 6, 27));
    assert_eq!(other_day.total_resolved, 0);
    assert_eq!(other_day.average_confidence, None);
}
