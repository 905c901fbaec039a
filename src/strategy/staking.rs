//! Tiered stake sizing.
//!
//! Stakes are a step function of payout odds: the longer the odds, the
//! smaller the stake. Bands are configuration because they get retuned.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ev::AmericanOdds;
use crate::types::Outcome;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One step of the stake schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeBand {
    pub label: String,
    /// Inclusive upper bound on American odds; `None` = unbounded.
    /// Negative odds sort below every positive bound.
    #[serde(default)]
    pub max_odds: Option<i32>,
    pub stake: Decimal,
}

/// Ordered stake bands, lowest odds first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeSchedule {
    pub bands: Vec<StakeBand>,
}

impl Default for StakeSchedule {
    fn default() -> Self {
        Self {
            bands: vec![
                StakeBand { label: "$100 (negative to +250)".into(), max_odds: Some(250), stake: dec!(100) },
                StakeBand { label: "$50 (+251 to +500)".into(), max_odds: Some(500), stake: dec!(50) },
                StakeBand { label: "$25 (+501 to +750)".into(), max_odds: Some(750), stake: dec!(25) },
                StakeBand { label: "$15 (above +750)".into(), max_odds: None, stake: dec!(15) },
            ],
        }
    }
}

impl StakeSchedule {
    /// Check the schedule is a total step function: non-empty, bounds
    /// strictly increasing, only the last band unbounded, stakes positive.
    pub fn validate(&self) -> Result<(), String> {
        let Some(last) = self.bands.last() else {
            return Err("stake schedule has no bands".into());
        };
        if last.max_odds.is_some() {
            return Err(format!("last stake band '{}' must be unbounded", last.label));
        }
        let mut previous: Option<i32> = None;
        for band in &self.bands[..self.bands.len() - 1] {
            let Some(max) = band.max_odds else {
                return Err(format!("only the last stake band may be unbounded ('{}')", band.label));
            };
            if let Some(prev) = previous {
                if max <= prev {
                    return Err(format!("stake band '{}' bound {max} not above {prev}", band.label));
                }
            }
            previous = Some(max);
        }
        if let Some(band) = self.bands.iter().find(|b| b.stake <= Decimal::ZERO) {
            return Err(format!("stake band '{}' has non-positive stake", band.label));
        }
        Ok(())
    }

    /// Position of a band label in schedule order (for report sorting).
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.bands.iter().position(|b| b.label == label)
    }
}

// ---------------------------------------------------------------------------
// Stake calculator
// ---------------------------------------------------------------------------

/// Stake assigned to a wager. Derived, never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeTier {
    pub label: String,
    pub stake: Decimal,
}

pub struct StakeCalculator {
    schedule: StakeSchedule,
}

impl StakeCalculator {
    pub fn new(schedule: StakeSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &StakeSchedule {
        &self.schedule
    }

    /// Stake for a given price. Pure and deterministic.
    pub fn stake_for(&self, odds: AmericanOdds) -> StakeTier {
        let band = self
            .schedule
            .bands
            .iter()
            .find(|b| b.max_odds.map_or(true, |max| odds.value() <= max))
            .or_else(|| self.schedule.bands.last());

        match band {
            Some(b) => StakeTier { label: b.label.clone(), stake: b.stake },
            // Unreachable with a validated schedule.
            None => StakeTier { label: "unstaked".into(), stake: Decimal::ZERO },
        }
    }

    /// Profit or loss for a settled wager, rounded to cents.
    ///
    /// win → stake × decimal multiplier; loss → −stake; push → 0;
    /// unresolved → `None`.
    pub fn profit_loss(&self, odds: AmericanOdds, stake: Decimal, outcome: Outcome) -> Option<Decimal> {
        let pnl = match outcome {
            Outcome::Win => (stake * odds.decimal_multiplier())
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            Outcome::Loss => -stake,
            Outcome::Push => Decimal::ZERO,
            Outcome::Unresolved => return None,
        };

        debug!(
            odds = %odds,
            stake = %stake,
            outcome = %outcome,
            pnl = %pnl,
            "Profit/loss computed"
        );

        Some(pnl)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
