//! Accountant: realized ROI by EV tier, stake tier and market.
//!
//! Reports are recomputed from the ledger on demand. Every figure is a sum
//! of the amounts stored on each resolved wager, so group totals always
//! reconcile with the overall line.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::strategy::Pricing;
use crate::types::{EvTier, MarketType, Outcome, ResolvedWager};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive observation-date window. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all dates"),
            (Some(s), None) => write!(f, "from {s}"),
            (None, Some(e)) => write!(f, "through {e}"),
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Performance summary
// ---------------------------------------------------------------------------

/// Results for one group of wagers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub label: String,
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    /// Counted, but never part of any rate or total.
    pub unresolved: usize,
    pub total_staked: Decimal,
    pub net_profit: Decimal,
    /// net profit / total staked, in percent. `None` with nothing staked.
    pub roi_percent: Option<Decimal>,
    /// Share of resolved wagers won, in percent.
    pub win_rate: Option<Decimal>,
    /// Share of resolved wagers pushed, in percent.
    pub push_rate: Option<Decimal>,
}

impl PerformanceSummary {
    fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: 0,
            wins: 0,
            losses: 0,
            pushes: 0,
            unresolved: 0,
            total_staked: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            roi_percent: None,
            win_rate: None,
            push_rate: None,
        }
    }

    fn add(&mut self, r: &ResolvedWager) {
        self.count += 1;
        match r.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Push => self.pushes += 1,
            Outcome::Unresolved => {
                self.unresolved += 1;
                return;
            }
        }
        self.total_staked += r.stake;
        self.net_profit += r.profit_loss.unwrap_or(Decimal::ZERO);
    }

    fn finish(mut self) -> Self {
        let resolved = self.resolved();
        if resolved > 0 {
            let n = Decimal::from(resolved);
            self.win_rate = Some(Decimal::from(self.wins) * dec!(100) / n);
            self.push_rate = Some(Decimal::from(self.pushes) * dec!(100) / n);
        }
        if self.total_staked > Decimal::ZERO {
            self.roi_percent = Some(self.net_profit * dec!(100) / self.total_staked);
        }
        self
    }

    pub fn resolved(&self) -> usize {
        self.wins + self.losses + self.pushes
    }
}

fn pct(v: Option<Decimal>) -> String {
    v.map(|v| format!("{:+.1}%", v)).unwrap_or_else(|| "-".to_string())
}

fn rate(v: Option<Decimal>) -> String {
    v.map(|v| format!("{:.1}%", v)).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<26} {:>6} {:>5}-{}-{} ({} open) staked ${:>10.2} P/L ${:>+10.2} ROI {:>7} win {:>6} push {:>5}",
            self.label,
            self.count,
            self.wins,
            self.losses,
            self.pushes,
            self.unresolved,
            self.total_staked,
            self.net_profit,
            pct(self.roi_percent),
            rate(self.win_rate),
            rate(self.push_rate),
        )
    }
}

// ---------------------------------------------------------------------------
// ROI report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RoiReport {
    pub range: DateRange,
    pub overall: PerformanceSummary,
    /// A through E, every tier present.
    pub by_ev_tier: Vec<PerformanceSummary>,
    /// Schedule order, populated bands only.
    pub by_stake_tier: Vec<PerformanceSummary>,
    /// Largest group first.
    pub by_market: Vec<PerformanceSummary>,
}

impl fmt::Display for RoiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROI report ({})", self.range)?;
        writeln!(f, "{}", self.overall)?;
        writeln!(f, "-- by EV tier --")?;
        for s in &self.by_ev_tier {
            writeln!(f, "{s}")?;
        }
        writeln!(f, "-- by stake tier --")?;
        for s in &self.by_stake_tier {
            writeln!(f, "{s}")?;
        }
        writeln!(f, "-- by market --")?;
        for s in &self.by_market {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Aggregate resolved wagers observed inside `range`.
    ///
    /// Wagers carrying a fair probability are grouped under the tier the
    /// classifier derives now, not the tier stored at ingest.
    pub fn summarize<'a>(
        resolved: impl IntoIterator<Item = &'a ResolvedWager>,
        range: DateRange,
        pricing: &Pricing,
    ) -> RoiReport {
        let mut overall = PerformanceSummary::empty("Overall");
        let mut by_tier: BTreeMap<EvTier, PerformanceSummary> = EvTier::ALL
            .iter()
            .map(|t| (*t, PerformanceSummary::empty(format!("Tier {t}"))))
            .collect();
        let mut by_stake: BTreeMap<String, PerformanceSummary> = BTreeMap::new();
        let mut by_market: BTreeMap<MarketType, PerformanceSummary> = BTreeMap::new();

        for r in resolved.into_iter().filter(|r| range.contains(r.wager.observation_date)) {
            overall.add(r);

            let tier = pricing.effective_tier(&r.wager);
            by_tier
                .entry(tier)
                .or_insert_with(|| PerformanceSummary::empty(format!("Tier {tier}")))
                .add(r);

            by_stake
                .entry(r.stake_tier.clone())
                .or_insert_with(|| PerformanceSummary::empty(r.stake_tier.clone()))
                .add(r);

            by_market
                .entry(r.wager.market_type)
                .or_insert_with(|| PerformanceSummary::empty(r.wager.market_type.label()))
                .add(r);
        }

        let schedule = pricing.stakes().schedule();
        let mut by_stake_tier: Vec<PerformanceSummary> =
            by_stake.into_values().map(PerformanceSummary::finish).collect();
        by_stake_tier.sort_by_key(|s| schedule.position_of(&s.label).unwrap_or(usize::MAX));

        let mut by_market: Vec<PerformanceSummary> =
            by_market.into_values().map(PerformanceSummary::finish).collect();
        by_market.sort_by(|a, b| b.count.cmp(&a.count));

        let report = RoiReport {
            range,
            overall: overall.finish(),
            by_ev_tier: by_tier.into_values().map(PerformanceSummary::finish).collect(),
            by_stake_tier,
            by_market,
        };

        info!(
            range = %range,
            wagers = report.overall.count,
            resolved = report.overall.resolved(),
            staked = format!("${:.2}", report.overall.total_staked),
            net = format!("${:+.2}", report.overall.net_profit),
            roi = pct(report.overall.roi_percent),
            "ROI report computed"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
