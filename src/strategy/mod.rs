//! Pricing: EV tiering and stake sizing.

pub mod ev;
pub mod staking;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::{EvTier, Wager, WagerError};
use ev::{AmericanOdds, EvClassifier};
use staking::{StakeCalculator, StakeTier};

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// One classifier and one stake schedule, shared by ingest, resolution and
/// reporting.
///
/// Everything that tiers or stakes a wager goes through this type so the
/// boundaries used when a wager is tagged are the ones used to group it.
pub struct Pricing {
    classifier: EvClassifier,
    stakes: StakeCalculator,
}

impl Pricing {
    pub fn new(classifier: EvClassifier, stakes: StakeCalculator) -> Self {
        Self { classifier, stakes }
    }

    pub fn classifier(&self) -> &EvClassifier {
        &self.classifier
    }

    pub fn stakes(&self) -> &StakeCalculator {
        &self.stakes
    }

    /// Tier for a freshly ingested wager.
    ///
    /// A fair probability takes precedence over an upstream tag; with
    /// neither present the wager cannot be tiered.
    pub fn tier_for(
        &self,
        wager_id: &str,
        odds: AmericanOdds,
        fair_probability: Option<Decimal>,
        tagged: Option<EvTier>,
    ) -> Result<EvTier, WagerError> {
        match (fair_probability, tagged) {
            (Some(fair), tagged) => {
                let tier = self.classifier.classify(odds, fair)?.tier;
                if let Some(upstream) = tagged.filter(|t| *t != tier) {
                    debug!(
                        wager = wager_id,
                        upstream = %upstream,
                        derived = %tier,
                        "Upstream EV tier replaced by derived tier"
                    );
                }
                Ok(tier)
            }
            (None, Some(tier)) => Ok(tier),
            (None, None) => Err(WagerError::MissingEvTier(wager_id.to_string())),
        }
    }

    /// Tier to group a stored wager under at reporting time.
    ///
    /// Re-derived when the wager carries a fair probability; a divergence
    /// from the stored tier is logged and the derived tier wins.
    pub fn effective_tier(&self, wager: &Wager) -> EvTier {
        let Some(fair) = wager.fair_probability else {
            return wager.expected_value_tier;
        };
        match self.classifier.classify(wager.payout_odds, fair) {
            Ok(c) if c.tier != wager.expected_value_tier => {
                warn!(
                    wager = %wager.id,
                    stored = %wager.expected_value_tier,
                    derived = %c.tier,
                    "Stored EV tier diverges from classifier"
                );
                c.tier
            }
            Ok(c) => c.tier,
            Err(e) => {
                warn!(wager = %wager.id, error = %e, "Cannot re-derive EV tier, keeping stored tier");
                wager.expected_value_tier
            }
        }
    }

    pub fn stake_for(&self, odds: AmericanOdds) -> StakeTier {
        self.stakes.stake_for(odds)
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(
            EvClassifier::new(ev::EvTierConfig::default()),
            StakeCalculator::new(staking::StakeSchedule::default()),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
