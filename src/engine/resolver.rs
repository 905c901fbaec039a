//! Resolution engine: settles wagers against box scores.
//!
//! For each wager: normalize the player name, find that player's box score
//! for the observation date, evaluate the market, stake it, and score how
//! much the automated result can be trusted. Results are kept in a
//! [`Ledger`] keyed by wager id so repeated runs only pick up what is still
//! open.

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{FlagKind, FlaggedItem};
use crate::markets::MarketRegistry;
use crate::names::{NameNormalizer, NameRepository};
use crate::strategy::Pricing;
use crate::types::{
    BoxScoreRecord, CanonicalPlayer, GameStatus, MarketType, Outcome, ResolutionSource,
    ResolvedWager, Wager, WagerError,
};

/// Resolved wagers by id. Ordered so persisted output is stable.
pub type Ledger = BTreeMap<String, ResolvedWager>;

// ---------------------------------------------------------------------------
// Box score index
// ---------------------------------------------------------------------------

/// Box scores keyed by (canonical key, game date).
///
/// Two players can share a name on one date, so each key holds one record
/// per team.
#[derive(Debug, Default)]
pub struct BoxScoreIndex {
    records: HashMap<(String, NaiveDate), Vec<BoxScoreRecord>>,
}

/// Result of looking a player up for one date.
#[derive(Debug, PartialEq)]
pub enum BoxScoreLookup<'a> {
    Found(&'a BoxScoreRecord),
    Missing,
    /// Several teams' records share the name and the wager's team doesn't
    /// pick one out.
    Ambiguous(Vec<&'a str>),
}

fn same_team(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl BoxScoreIndex {
    /// Index records and register every player as a canonical name.
    ///
    /// When one team has two records for a player on one date the first
    /// final one is kept.
    pub fn build(records: Vec<BoxScoreRecord>, names: &dyn NameRepository) -> Self {
        let mut index = Self::default();
        for record in records {
            let player = record.canonical();
            let key = (player.key(), record.game_date);
            if key.0.is_empty() {
                warn!(player = %record.player, "Box score without a usable player name skipped");
                continue;
            }
            names.register_canonical(player);

            let slot = index.records.entry(key).or_default();
            match slot.iter().position(|r| same_team(&r.team, &record.team)) {
                Some(i) if slot[i].game_status == GameStatus::Final => {
                    debug!(
                        player = %record.player,
                        team = %record.team,
                        date = %record.game_date,
                        "Second box score for player/team/date ignored"
                    );
                }
                Some(i) => slot[i] = record,
                None => slot.push(record),
            }
        }
        info!(records = index.len(), "Box score index built");
        index
    }

    /// Find the record for a player on a date.
    ///
    /// `team` decides between same-named players; with a single record a
    /// team mismatch is tolerated, since books and stats feeds abbreviate
    /// teams differently.
    pub fn get(&self, player: &CanonicalPlayer, date: NaiveDate, team: Option<&str>) -> BoxScoreLookup<'_> {
        let Some(candidates) = self.records.get(&(player.key(), date)) else {
            return BoxScoreLookup::Missing;
        };
        if let Some(team) = team {
            if let Some(r) = candidates.iter().find(|r| same_team(&r.team, team)) {
                return BoxScoreLookup::Found(r);
            }
        }
        match candidates.as_slice() {
            [] => BoxScoreLookup::Missing,
            [only] => BoxScoreLookup::Found(only),
            many => BoxScoreLookup::Ambiguous(many.iter().map(|r| r.team.as_str()).collect()),
        }
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Confidence of an exact name match on a final game.
    pub exact_final_confidence: f64,
    /// Subtracted when the name was matched fuzzily.
    pub fuzzy_penalty: f64,
    /// Subtracted when the game's completion status is unknown.
    pub ambiguous_status_penalty: f64,
    /// Terminal results below this are flagged for review.
    pub review_threshold: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            exact_final_confidence: 0.95,
            fuzzy_penalty: 0.15,
            ambiguous_status_penalty: 0.20,
            review_threshold: 0.80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Skip wagers that already have a terminal result.
    #[default]
    Normal,
    /// Re-resolve everything and report what changed.
    Correction,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::Normal => write!(f, "normal"),
            ResolutionMode::Correction => write!(f, "correction"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub mode: ResolutionMode,
    pub total: usize,
    /// Reached a terminal outcome in this run.
    pub resolved: usize,
    pub unresolved: usize,
    /// Skipped because the ledger already had a terminal result.
    pub already_resolved: usize,
    /// Can never resolve as stated.
    pub failed: usize,
    /// Previously terminal results this run changed.
    pub corrected: usize,
    pub flagged: Vec<FlaggedItem>,
    /// Distinct raw names that matched nothing, for curation.
    pub unmatched_names: Vec<String>,
    pub cancelled: bool,
}

impl RunSummary {
    fn new(mode: ResolutionMode, total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            total,
            resolved: 0,
            unresolved: 0,
            already_resolved: 0,
            failed: 0,
            corrected: 0,
            flagged: Vec::new(),
            unmatched_names: Vec::new(),
            cancelled: false,
        }
    }

    fn flag(&mut self, wager: &Wager, kind: FlagKind, reason: impl Into<String>) {
        self.flagged.push(FlaggedItem {
            wager_id: wager.id.clone(),
            player: wager.player.clone(),
            kind,
            reason: reason.into(),
        });
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} ({}): {} wagers, {} resolved, {} unresolved, {} already resolved, {} failed, {} corrected, {} flagged{}",
            self.run_id,
            self.mode,
            self.total,
            self.resolved,
            self.unresolved,
            self.already_resolved,
            self.failed,
            self.corrected,
            self.flagged.len(),
            if self.cancelled { " [CANCELLED]" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ResolutionEngine {
    names: NameNormalizer,
    markets: MarketRegistry,
    pricing: Pricing,
    config: ResolutionConfig,
}

impl ResolutionEngine {
    pub fn new(
        names: NameNormalizer,
        markets: MarketRegistry,
        pricing: Pricing,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            names,
            markets,
            pricing,
            config,
        }
    }

    pub fn names(&self) -> &NameNormalizer {
        &self.names
    }

    pub fn markets(&self) -> &MarketRegistry {
        &self.markets
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Resolve a single wager. Never fails: problems leave it unresolved
    /// with a note.
    pub fn resolve(&self, wager: &Wager, index: &BoxScoreIndex) -> ResolvedWager {
        self.resolve_inner(wager, index).0
    }

    fn resolve_inner(&self, wager: &Wager, index: &BoxScoreIndex) -> (ResolvedWager, Option<WagerError>) {
        let stake = self.pricing.stake_for(wager.payout_odds);
        let mut resolved = ResolvedWager {
            wager: wager.clone(),
            outcome: Outcome::Unresolved,
            confidence: 0.0,
            actual_stat_value: None,
            canonical_player: None,
            name_match: None,
            stake: stake.stake,
            stake_tier: stake.label,
            profit_loss: None,
            needs_review: false,
            source: ResolutionSource::BoxScore,
            resolved_at: Utc::now(),
            note: None,
        };

        let name = self.names.normalize(&wager.player, wager.observation_date);
        let Some(player) = name.player().cloned() else {
            let err = WagerError::NameNotResolved {
                player: wager.player.clone(),
                date: wager.observation_date,
            };
            resolved.note = Some(err.to_string());
            return (resolved, Some(err));
        };
        resolved.name_match = name.mapping_type();
        resolved.canonical_player = Some(player.clone());

        let record = match index.get(&player, wager.observation_date, wager.team.as_deref()) {
            BoxScoreLookup::Found(record) => record,
            BoxScoreLookup::Missing => {
                let err = WagerError::BoxScoreMissing {
                    player: player.name().to_string(),
                    date: wager.observation_date,
                };
                resolved.note = Some(err.to_string());
                return (resolved, Some(err));
            }
            BoxScoreLookup::Ambiguous(teams) => {
                let err = WagerError::AmbiguousPlayer {
                    player: player.name().to_string(),
                    date: wager.observation_date,
                    teams: teams.join(", "),
                };
                resolved.note = Some(err.to_string());
                return (resolved, Some(err));
            }
        };

        let ambiguous = match record.game_status {
            GameStatus::Final => false,
            GameStatus::Unknown => true,
            status @ (GameStatus::InProgress | GameStatus::Postponed) => {
                let err = WagerError::GameNotFinal {
                    player: player.name().to_string(),
                    date: wager.observation_date,
                    status,
                };
                resolved.note = Some(err.to_string());
                return (resolved, Some(err));
            }
        };

        let evaluation = match self
            .markets
            .evaluate(wager.market_type, wager.line, wager.side, Some(record))
        {
            Ok(e) => e,
            Err(err) => {
                resolved.note = Some(err.to_string());
                return (resolved, Some(err));
            }
        };

        let mut confidence = self.config.exact_final_confidence;
        if matches!(name, crate::names::NameMatch::Fuzzy { .. }) {
            confidence -= self.config.fuzzy_penalty;
        }
        if ambiguous {
            confidence -= self.config.ambiguous_status_penalty;
            resolved.note = Some(
                WagerError::AmbiguousGameCompletion {
                    player: player.name().to_string(),
                    date: wager.observation_date,
                }
                .to_string(),
            );
        }
        // Four places, so 0.95 - 0.15 compares equal to 0.80.
        let confidence = (confidence.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0;

        resolved.outcome = evaluation.outcome;
        resolved.actual_stat_value = evaluation.actual;
        resolved.confidence = confidence;
        resolved.profit_loss =
            self.pricing
                .stakes()
                .profit_loss(wager.payout_odds, resolved.stake, evaluation.outcome);
        resolved.needs_review =
            evaluation.outcome.is_terminal() && (ambiguous || confidence < self.config.review_threshold);

        debug!(
            wager = %wager.id,
            outcome = %resolved.outcome,
            confidence = format!("{confidence:.2}"),
            "Wager resolved"
        );

        (resolved, None)
    }

    /// Resolve a batch into the ledger.
    ///
    /// Per-wager problems are counted and flagged, never returned. Setting
    /// `cancel` stops before the next wager; everything already written to
    /// the ledger stays valid.
    pub fn resolve_batch(
        &self,
        wagers: &[Wager],
        index: &BoxScoreIndex,
        ledger: &mut Ledger,
        mode: ResolutionMode,
        cancel: &AtomicBool,
    ) -> RunSummary {
        let mut summary = RunSummary::new(mode, wagers.len());
        info!(run_id = %summary.run_id, wagers = wagers.len(), mode = %mode, "Resolution run started");

        for wager in wagers {
            if cancel.load(Ordering::Relaxed) {
                warn!(run_id = %summary.run_id, "Resolution run cancelled");
                summary.cancelled = true;
                break;
            }

            let previous = ledger.get(&wager.id);
            if let Some(prev) = previous {
                if prev.is_terminal()
                    && (mode == ResolutionMode::Normal || prev.source == ResolutionSource::Manual)
                {
                    summary.already_resolved += 1;
                    continue;
                }
            }

            let (resolved, issue) = self.resolve_inner(wager, index);

            if let Some(err) = &issue {
                match err {
                    WagerError::NameNotResolved { player, .. } => {
                        if !summary.unmatched_names.contains(player) {
                            summary.unmatched_names.push(player.clone());
                        }
                        summary.flag(wager, FlagKind::UnmatchedName, err.to_string());
                    }
                    e if e.is_retryable() => summary.flag(wager, FlagKind::Unresolved, e.to_string()),
                    e => {
                        summary.failed += 1;
                        summary.flag(wager, FlagKind::Failed, e.to_string());
                    }
                }
            }

            if let Some(prev) = previous.filter(|p| p.is_terminal()) {
                if !resolved.is_terminal() {
                    // A terminal result never regresses to unresolved.
                    warn!(
                        wager = %wager.id,
                        kept = %prev.outcome,
                        "Correction could not re-resolve wager, keeping previous result"
                    );
                    summary.already_resolved += 1;
                    continue;
                }
                if !prev.same_result(&resolved) {
                    info!(
                        wager = %wager.id,
                        before = %prev.outcome,
                        after = %resolved.outcome,
                        "Resolution corrected"
                    );
                    summary.corrected += 1;
                    summary.flag(
                        wager,
                        FlagKind::Corrected,
                        format!("{} → {}", prev.outcome, resolved.outcome),
                    );
                }
            }

            if resolved.is_terminal() {
                summary.resolved += 1;
                if resolved.needs_review {
                    summary.flag(
                        wager,
                        FlagKind::LowConfidence,
                        format!("confidence {:.2}", resolved.confidence),
                    );
                }
            } else if issue.as_ref().map_or(true, |e| e.is_retryable()) {
                summary.unresolved += 1;
            }

            ledger.insert(wager.id.clone(), resolved);
        }

        info!(
            run_id = %summary.run_id,
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            already_resolved = summary.already_resolved,
            failed = summary.failed,
            corrected = summary.corrected,
            unmatched = summary.unmatched_names.len(),
            cancelled = summary.cancelled,
            "Resolution run complete"
        );

        summary
    }

    /// Settle a wager by hand. Manual results are final: later runs,
    /// correction runs included, leave them alone.
    pub fn settle_manually(
        &self,
        wager: &Wager,
        outcome: Outcome,
        actual: Option<Decimal>,
        note: Option<String>,
        ledger: &mut Ledger,
    ) -> Result<ResolvedWager> {
        if !outcome.is_terminal() {
            bail!("Manual settlement of {} must be win, loss or push", wager.id);
        }

        let stake = self.pricing.stake_for(wager.payout_odds);
        let lookup = self.names.lookup(&wager.player);
        let resolved = ResolvedWager {
            wager: wager.clone(),
            outcome,
            confidence: 1.0,
            actual_stat_value: actual,
            canonical_player: lookup.player().cloned(),
            name_match: lookup.mapping_type(),
            profit_loss: self.pricing.stakes().profit_loss(wager.payout_odds, stake.stake, outcome),
            stake: stake.stake,
            stake_tier: stake.label,
            needs_review: false,
            source: ResolutionSource::Manual,
            resolved_at: Utc::now(),
            note,
        };

        info!(wager = %wager.id, outcome = %outcome, "Wager settled manually");
        ledger.insert(wager.id.clone(), resolved.clone());
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Resolution summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketBreakdown {
    pub market: MarketType,
    pub count: usize,
    pub average_confidence: f64,
}

/// How a set of terminal results was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub total_resolved: usize,
    pub auto_resolved: usize,
    pub manual_resolved: usize,
    pub needs_review: usize,
    pub average_confidence: Option<f64>,
    /// Automated resolutions per market, largest first.
    pub market_breakdown: Vec<MarketBreakdown>,
}

/// Summarize terminal results, optionally for one observation date.
pub fn resolution_summary<'a>(
    resolved: impl IntoIterator<Item = &'a ResolvedWager>,
    date: Option<NaiveDate>,
) -> ResolutionSummary {
    let terminal: Vec<&ResolvedWager> = resolved
        .into_iter()
        .filter(|r| r.is_terminal())
        .filter(|r| date.map_or(true, |d| r.wager.observation_date == d))
        .collect();

    let auto: Vec<&ResolvedWager> = terminal
        .iter()
        .copied()
        .filter(|r| r.source == ResolutionSource::BoxScore)
        .collect();

    let mut per_market: HashMap<MarketType, (usize, f64)> = HashMap::new();
    for r in &auto {
        let entry = per_market.entry(r.wager.market_type).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += r.confidence;
    }
    let mut market_breakdown: Vec<MarketBreakdown> = per_market
        .into_iter()
        .map(|(market, (count, sum))| MarketBreakdown {
            market,
            count,
            average_confidence: sum / count as f64,
        })
        .collect();
    market_breakdown.sort_by(|a, b| b.count.cmp(&a.count).then(a.market.cmp(&b.market)));

    let average_confidence = if terminal.is_empty() {
        None
    } else {
        Some(terminal.iter().map(|r| r.confidence).sum::<f64>() / terminal.len() as f64)
    };

    ResolutionSummary {
        total_resolved: terminal.len(),
        auto_resolved: auto.len(),
        manual_resolved: terminal.len() - auto.len(),
        needs_review: terminal.iter().filter(|r| r.needs_review).count(),
        average_confidence,
        market_breakdown,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
