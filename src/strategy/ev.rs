//! Expected-value classification.
//!
//! Converts American payout odds and a fair-probability estimate into an
//! edge and a discrete A–E tier. The same classifier instance tiers wagers
//! at ingest and groups them at reporting time, so both sides always use
//! identical boundaries.

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use crate::types::{EvTier, WagerError};

// ---------------------------------------------------------------------------
// American odds
// ---------------------------------------------------------------------------

/// Signed American odds (+150, -110). Never inside (-100, +100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AmericanOdds(i32);

impl AmericanOdds {
    pub fn new(value: i32) -> Result<Self, WagerError> {
        if value > -100 && value < 100 {
            return Err(WagerError::MalformedOddsString(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Parse the odds formats sportsbooks emit: `+150`, `-110`,
    /// `1.5 (+150)`, `(-105)`, `EVEN`, and decimal odds like `2.50`.
    pub fn parse(raw: &str) -> Result<Self, WagerError> {
        static PAREN_RE: OnceLock<Regex> = OnceLock::new();
        static SIGNED_RE: OnceLock<Regex> = OnceLock::new();

        let malformed = || WagerError::MalformedOddsString(raw.to_string());
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(malformed());
        }

        let paren = PAREN_RE.get_or_init(|| Regex::new(r"\(\s*([+-]?\d+)\s*\)").unwrap());
        if let Some(caps) = paren.captures(trimmed) {
            let value: i32 = caps[1].parse().map_err(|_| malformed())?;
            return Self::new(value).map_err(|_| malformed());
        }

        let upper = trimmed.to_uppercase();
        if upper == "EVEN" || upper == "EV" || upper == "EVS" {
            return Ok(Self(100));
        }

        let signed = SIGNED_RE.get_or_init(|| Regex::new(r"^[+-]\d+$").unwrap());
        if signed.is_match(trimmed) {
            let value: i32 = trimmed.parse().map_err(|_| malformed())?;
            return Self::new(value).map_err(|_| malformed());
        }

        // Decimal (European) odds
        let decimal = Decimal::from_str(trimmed).map_err(|_| malformed())?;
        Self::from_decimal_odds(decimal).ok_or_else(malformed)
    }

    /// Convert decimal odds (total return per unit, stake included).
    pub fn from_decimal_odds(decimal: Decimal) -> Option<Self> {
        if decimal <= Decimal::ONE {
            return None;
        }
        let net = decimal - Decimal::ONE;
        // Out-of-range inputs overflow the decimal type; those are malformed.
        let american = if net >= Decimal::ONE {
            net.checked_mul(dec!(100))?.round()
        } else {
            -dec!(100).checked_div(net)?.round()
        };
        american.to_i32().and_then(|v| Self::new(v).ok())
    }

    /// Net profit per unit staked on a win (+150 → 1.5, -110 → 0.9090…).
    pub fn decimal_multiplier(&self) -> Decimal {
        if self.0 > 0 {
            Decimal::from(self.0) / dec!(100)
        } else {
            dec!(100) / Decimal::from(self.0.abs())
        }
    }

    /// Break-even probability the book is quoting (vig included).
    pub fn implied_probability(&self) -> Decimal {
        if self.0 > 0 {
            dec!(100) / (Decimal::from(self.0) + dec!(100))
        } else {
            let magnitude = Decimal::from(self.0.abs());
            magnitude / (magnitude + dec!(100))
        }
    }
}

impl TryFrom<i32> for AmericanOdds {
    type Error = WagerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AmericanOdds> for i32 {
    fn from(odds: AmericanOdds) -> Self {
        odds.0
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Minimum edge for each tier above `A`. An edge below `b` is tier `A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvTierConfig {
    pub b: Decimal,
    pub c: Decimal,
    pub d: Decimal,
    pub e: Decimal,
}

impl Default for EvTierConfig {
    fn default() -> Self {
        Self {
            b: dec!(0.01),
            c: dec!(0.02),
            d: dec!(0.04),
            e: dec!(0.08),
        }
    }
}

impl EvTierConfig {
    /// Boundaries must be strictly increasing or tiers would overlap.
    pub fn is_ordered(&self) -> bool {
        self.b < self.c && self.c < self.d && self.d < self.e
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Edge computed for one wager.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub implied_probability: Decimal,
    /// fair − implied
    pub edge: Decimal,
    /// Expected profit per unit staked.
    pub expected_value: Decimal,
    pub tier: EvTier,
}

pub struct EvClassifier {
    config: EvTierConfig,
}

impl EvClassifier {
    pub fn new(config: EvTierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvTierConfig {
        &self.config
    }

    /// Classify a wager's edge given the book's odds and a fair probability.
    pub fn classify(
        &self,
        odds: AmericanOdds,
        fair_probability: Decimal,
    ) -> Result<Classification, WagerError> {
        if fair_probability <= Decimal::ZERO || fair_probability >= Decimal::ONE {
            return Err(WagerError::InvalidProbability(fair_probability));
        }

        let implied = odds.implied_probability();
        let edge = fair_probability - implied;
        let expected_value =
            fair_probability * odds.decimal_multiplier() - (Decimal::ONE - fair_probability);
        let tier = self.tier_for_edge(edge);

        debug!(
            odds = %odds,
            fair = %fair_probability.round_dp(4),
            implied = %implied.round_dp(4),
            edge = %edge.round_dp(4),
            tier = %tier,
            "Wager classified"
        );

        Ok(Classification {
            implied_probability: implied,
            edge,
            expected_value,
            tier,
        })
    }

    /// Map an edge onto its band.
    pub fn tier_for_edge(&self, edge: Decimal) -> EvTier {
        if edge >= self.config.e {
            EvTier::E
        } else if edge >= self.config.d {
            EvTier::D
        } else if edge >= self.config.c {
            EvTier::C
        } else if edge >= self.config.b {
            EvTier::B
        } else {
            EvTier::A
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
