//! Market outcome evaluator.
//!
//! Each market type maps to a [`MarketRule`]: which box-score counters make
//! up the settled value, how that value is compared to the line, and whether
//! an exact landing pushes. Settlement code never branches on the market
//! itself, so adding a market is one table row.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::types::{BetSide, BoxScoreRecord, LineValue, MarketType, Outcome, StatField, StatLine, WagerError};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// How the settled value is read off a stat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatSelector {
    /// Sum of one or more counters.
    Sum(Vec<StatField>),
    /// Pitching outs / 3, exact.
    InningsFromOuts,
}

impl StatSelector {
    pub fn value(&self, stats: &StatLine) -> Decimal {
        match self {
            StatSelector::Sum(fields) => fields
                .iter()
                .map(|f| Decimal::from(f.read(stats)))
                .sum(),
            StatSelector::InningsFromOuts => Decimal::from(stats.pitching_outs) / dec!(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Over wins above the line, under wins below it.
    OverUnder,
    /// Yes wins on at least one occurrence, no wins on none.
    Proposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRule {
    pub selector: StatSelector,
    pub comparison: Comparison,
    /// Whether a result landing exactly on a whole-number line pushes.
    /// When false, both sides lose.
    #[serde(default)]
    pub push_eligible: bool,
}

impl MarketRule {
    fn over_under(fields: &[StatField]) -> Self {
        Self {
            selector: StatSelector::Sum(fields.to_vec()),
            comparison: Comparison::OverUnder,
            push_eligible: true,
        }
    }

    fn proposition(field: StatField) -> Self {
        Self {
            selector: StatSelector::Sum(vec![field]),
            comparison: Comparison::Proposition,
            push_eligible: false,
        }
    }
}

/// Built-in rule for every market.
pub fn default_rule(market: MarketType) -> MarketRule {
    use MarketType as M;
    use StatField as F;

    match market {
        M::Hits => MarketRule::over_under(&[F::Hits]),
        M::Runs => MarketRule::over_under(&[F::Runs]),
        M::Rbis => MarketRule::over_under(&[F::Rbi]),
        M::HomeRuns => MarketRule::over_under(&[F::HomeRuns]),
        M::Singles => MarketRule::over_under(&[F::Singles]),
        M::Doubles => MarketRule::over_under(&[F::Doubles]),
        M::Triples => MarketRule::over_under(&[F::Triples]),
        M::Walks => MarketRule::over_under(&[F::Walks]),
        M::BatterStrikeouts => MarketRule::over_under(&[F::Strikeouts]),
        M::StolenBases => MarketRule::over_under(&[F::StolenBases]),
        M::TotalBases => MarketRule::over_under(&[F::TotalBases]),
        M::HitsRunsRbis => MarketRule::over_under(&[F::Hits, F::Runs, F::Rbi]),
        M::HitsRuns => MarketRule::over_under(&[F::Hits, F::Runs]),
        M::PitcherStrikeouts => MarketRule::over_under(&[F::StrikeoutsPitched]),
        M::PitchingOuts => MarketRule::over_under(&[F::PitchingOuts]),
        M::InningsPitched => MarketRule {
            selector: StatSelector::InningsFromOuts,
            comparison: Comparison::OverUnder,
            push_eligible: true,
        },
        M::HitsAllowed => MarketRule::over_under(&[F::HitsAllowed]),
        M::EarnedRuns => MarketRule::over_under(&[F::EarnedRuns]),
        M::WalksAllowed => MarketRule::over_under(&[F::WalksAllowed]),
        M::HomeRunsAllowed => MarketRule::over_under(&[F::HomeRunsAllowed]),
        M::FieldingAssists => MarketRule::over_under(&[F::FieldingAssists]),
        M::FieldingPutouts => MarketRule::over_under(&[F::FieldingPutouts]),
        M::FieldingErrors => MarketRule::over_under(&[F::FieldingErrors]),
        M::ToHitHomeRun => MarketRule::proposition(F::HomeRuns),
        M::ToRecordHit => MarketRule::proposition(F::Hits),
        M::ToRecordRbi => MarketRule::proposition(F::Rbi),
        M::ToRecordStolenBase => MarketRule::proposition(F::StolenBases),
        M::ToScoreRun => MarketRule::proposition(F::Runs),
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Settled value and outcome of one wager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// `None` when there was nothing to read (no box score).
    pub actual: Option<Decimal>,
    pub outcome: Outcome,
}

impl Evaluation {
    fn unresolved() -> Self {
        Self { actual: None, outcome: Outcome::Unresolved }
    }
}

pub struct MarketRegistry {
    rules: HashMap<MarketType, MarketRule>,
}

impl Default for MarketRegistry {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

impl MarketRegistry {
    /// Built-in rules with `overrides` applied on top.
    pub fn new(overrides: &HashMap<MarketType, MarketRule>) -> Self {
        let mut rules: HashMap<MarketType, MarketRule> = MarketType::ALL
            .iter()
            .map(|m| (*m, default_rule(*m)))
            .collect();
        for (market, rule) in overrides {
            debug!(market = %market, rule = ?rule, "Market rule overridden");
            rules.insert(*market, rule.clone());
        }
        Self { rules }
    }

    pub fn rule(&self, market: MarketType) -> Result<&MarketRule, WagerError> {
        self.rules
            .get(&market)
            .ok_or_else(|| WagerError::UnsupportedMarketType(market.to_string()))
    }

    /// Settle one side of a market against a box score.
    ///
    /// A missing box score is not an error: the wager stays unresolved.
    pub fn evaluate(
        &self,
        market: MarketType,
        line: LineValue,
        side: BetSide,
        box_score: Option<&BoxScoreRecord>,
    ) -> Result<Evaluation, WagerError> {
        let rule = self.rule(market)?;
        check_line(market, rule, line)?;

        let Some(record) = box_score else {
            return Ok(Evaluation::unresolved());
        };

        let actual = rule.selector.value(&record.stats);
        let outcome = match rule.comparison {
            Comparison::Proposition => settle_proposition(actual, side),
            Comparison::OverUnder => match line.threshold() {
                Some(threshold) => settle_over_under(actual, threshold, side, rule.push_eligible && line.is_whole()),
                None => return Err(malformed(market, "over/under market needs a numeric line")),
            },
        };

        Ok(Evaluation { actual: Some(actual), outcome })
    }
}

fn malformed(market: MarketType, detail: &str) -> WagerError {
    WagerError::MalformedLine {
        market: market.to_string(),
        detail: detail.to_string(),
    }
}

fn check_line(market: MarketType, rule: &MarketRule, line: LineValue) -> Result<(), WagerError> {
    match (rule.comparison, line) {
        (_, LineValue::Threshold(v)) if v.is_sign_negative() => Err(malformed(market, "negative line")),
        (Comparison::OverUnder, LineValue::Proposition) => {
            Err(malformed(market, "yes/no line on an over/under market"))
        }
        // Books sometimes quote propositions as over 0.5.
        (Comparison::Proposition, LineValue::Threshold(v)) if v >= Decimal::ONE => {
            Err(malformed(market, "proposition market quoted with a line of one or more"))
        }
        _ => Ok(()),
    }
}

fn settle_over_under(actual: Decimal, line: Decimal, side: BetSide, pushes: bool) -> Outcome {
    if actual == line {
        return if pushes { Outcome::Push } else { Outcome::Loss };
    }
    let over_wins = actual > line;
    match (side, over_wins) {
        (BetSide::Over, true) | (BetSide::Under, false) => Outcome::Win,
        _ => Outcome::Loss,
    }
}

fn settle_proposition(actual: Decimal, side: BetSide) -> Outcome {
    let happened = actual >= Decimal::ONE;
    match (side, happened) {
        (BetSide::Over, true) | (BetSide::Under, false) => Outcome::Win,
        _ => Outcome::Loss,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
