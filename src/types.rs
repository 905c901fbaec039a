//! Shared types for PROPSETTLE.
//!
//! These types form the data model used across all modules: wagers as
//! handed over by odds processing, box scores as handed over by stats
//! collection, and the resolved records this crate writes back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::strategy::ev::AmericanOdds;

// ---------------------------------------------------------------------------
// Player identity
// ---------------------------------------------------------------------------

/// The single normalized identity used to join odds data to stats data.
///
/// Holds the display name as reported by the stats source; `key()` is
/// the join key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPlayer(String);

impl CanonicalPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Normalized join key (see [`crate::names::normalize_key`]).
    pub fn key(&self) -> String {
        crate::names::normalize_key(&self.0)
    }
}

impl fmt::Display for CanonicalPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a raw name was tied to its canonical identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    Exact,
    Fuzzy,
    Manual,
}

impl MappingType {
    /// Whether the mapping was produced without a human in the loop.
    pub fn is_automated(&self) -> bool {
        !matches!(self, MappingType::Manual)
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingType::Exact => write!(f, "exact"),
            MappingType::Fuzzy => write!(f, "fuzzy"),
            MappingType::Manual => write!(f, "manual"),
        }
    }
}

// ---------------------------------------------------------------------------
// Market types
// ---------------------------------------------------------------------------

/// Every player-prop market the resolver knows how to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    // Batting
    Hits,
    Runs,
    Rbis,
    HomeRuns,
    Singles,
    Doubles,
    Triples,
    Walks,
    BatterStrikeouts,
    StolenBases,
    TotalBases,
    HitsRunsRbis,
    HitsRuns,
    // Pitching
    PitcherStrikeouts,
    PitchingOuts,
    InningsPitched,
    HitsAllowed,
    EarnedRuns,
    WalksAllowed,
    HomeRunsAllowed,
    // Fielding
    FieldingAssists,
    FieldingPutouts,
    FieldingErrors,
    // Yes/no propositions
    ToHitHomeRun,
    ToRecordHit,
    ToRecordRbi,
    ToRecordStolenBase,
    ToScoreRun,
}

impl MarketType {
    pub const ALL: &'static [MarketType] = &[
        MarketType::Hits,
        MarketType::Runs,
        MarketType::Rbis,
        MarketType::HomeRuns,
        MarketType::Singles,
        MarketType::Doubles,
        MarketType::Triples,
        MarketType::Walks,
        MarketType::BatterStrikeouts,
        MarketType::StolenBases,
        MarketType::TotalBases,
        MarketType::HitsRunsRbis,
        MarketType::HitsRuns,
        MarketType::PitcherStrikeouts,
        MarketType::PitchingOuts,
        MarketType::InningsPitched,
        MarketType::HitsAllowed,
        MarketType::EarnedRuns,
        MarketType::WalksAllowed,
        MarketType::HomeRunsAllowed,
        MarketType::FieldingAssists,
        MarketType::FieldingPutouts,
        MarketType::FieldingErrors,
        MarketType::ToHitHomeRun,
        MarketType::ToRecordHit,
        MarketType::ToRecordRbi,
        MarketType::ToRecordStolenBase,
        MarketType::ToScoreRun,
    ];

    /// Human-readable label, as sportsbooks print it.
    pub fn label(&self) -> &'static str {
        match self {
            MarketType::Hits => "Hits",
            MarketType::Runs => "Runs",
            MarketType::Rbis => "RBIs",
            MarketType::HomeRuns => "Home Runs",
            MarketType::Singles => "Singles",
            MarketType::Doubles => "Doubles",
            MarketType::Triples => "Triples",
            MarketType::Walks => "Walks",
            MarketType::BatterStrikeouts => "Batter Strikeouts",
            MarketType::StolenBases => "Stolen Bases",
            MarketType::TotalBases => "Total Bases",
            MarketType::HitsRunsRbis => "Hits + Runs + RBIs",
            MarketType::HitsRuns => "Hits + Runs",
            MarketType::PitcherStrikeouts => "Pitcher Strikeouts",
            MarketType::PitchingOuts => "Pitching Outs",
            MarketType::InningsPitched => "Innings Pitched",
            MarketType::HitsAllowed => "Hits Allowed",
            MarketType::EarnedRuns => "Earned Runs",
            MarketType::WalksAllowed => "Walks Allowed",
            MarketType::HomeRunsAllowed => "Home Runs Allowed",
            MarketType::FieldingAssists => "Assists",
            MarketType::FieldingPutouts => "Putouts",
            MarketType::FieldingErrors => "Errors",
            MarketType::ToHitHomeRun => "To Hit a Home Run",
            MarketType::ToRecordHit => "To Record a Hit",
            MarketType::ToRecordRbi => "To Record an RBI",
            MarketType::ToRecordStolenBase => "To Record a Stolen Base",
            MarketType::ToScoreRun => "To Score a Run",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Reduce a scraped market label to a comparable token: lowercase
/// alphanumerics and `+` only, with "and"/"&" read as `+`.
fn market_token(label: &str) -> String {
    let lower = label.to_lowercase().replace(" and ", "+").replace('&', "+");
    lower
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+')
        .collect()
}

/// Parse a scraped market label (case-insensitive, common aliases).
impl std::str::FromStr for MarketType {
    type Err = WagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = market_token(s);
        let market = match token.as_str() {
            "hits" | "batterhits" | "playerhits" => MarketType::Hits,
            "runs" | "runsscored" | "batterruns" | "batterrunsscored" => MarketType::Runs,
            "rbis" | "rbi" | "runsbattedin" | "batterrbis" => MarketType::Rbis,
            "homeruns" | "homers" | "batterhomeruns" => MarketType::HomeRuns,
            "singles" | "battersingles" => MarketType::Singles,
            "doubles" | "batterdoubles" => MarketType::Doubles,
            "triples" | "battertriples" => MarketType::Triples,
            "walks" | "baseonballs" | "batterwalks" => MarketType::Walks,
            "batterstrikeouts" | "strikeoutsbatter" | "hitterstrikeouts" => {
                MarketType::BatterStrikeouts
            }
            "stolenbases" | "batterstolenbases" => MarketType::StolenBases,
            "totalbases" | "battertotalbases" => MarketType::TotalBases,
            "hits+runs+rbis" | "hits+runs+rbi" | "h+r+rbi" | "hitsrunsrbis" | "hrr" => {
                MarketType::HitsRunsRbis
            }
            "hits+runs" | "h+r" | "hitsruns" => MarketType::HitsRuns,
            "pitcherstrikeouts" | "strikeouts" | "strikeoutsthrown" | "pitchingstrikeouts"
            | "strikeoutspitcher" => MarketType::PitcherStrikeouts,
            "pitchingouts" | "outsrecorded" | "pitcheroutsrecorded" | "pitcherouts" => {
                MarketType::PitchingOuts
            }
            "inningspitched" | "pitcherinningspitched" => MarketType::InningsPitched,
            "hitsallowed" | "pitcherhitsallowed" => MarketType::HitsAllowed,
            "earnedruns" | "earnedrunsallowed" | "pitcherearnedruns" => MarketType::EarnedRuns,
            "walksallowed" | "pitcherwalks" | "pitcherwalksallowed" => MarketType::WalksAllowed,
            "homerunsallowed" | "pitcherhomerunsallowed" => MarketType::HomeRunsAllowed,
            "assists" | "fieldingassists" => MarketType::FieldingAssists,
            "putouts" | "fieldingputouts" => MarketType::FieldingPutouts,
            "errors" | "fieldingerrors" => MarketType::FieldingErrors,
            "tohitahomerun" | "tohithomerun" | "anytimehomerun" | "anytimehr" | "hitahomerun" => {
                MarketType::ToHitHomeRun
            }
            "torecordahit" | "torecordhit" | "recordahit" => MarketType::ToRecordHit,
            "torecordanrbi" | "torecordrbi" | "recordanrbi" => MarketType::ToRecordRbi,
            "torecordastolenbase" | "torecordstolenbase" | "tostealabase" | "stealabase" => {
                MarketType::ToRecordStolenBase
            }
            "toscorearun" | "toscorerun" | "anytimerun" => MarketType::ToScoreRun,
            _ => return Err(WagerError::UnsupportedMarketType(s.to_string())),
        };
        Ok(market)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Bet direction. Yes/no propositions map yes → `Over`, no → `Under`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetSide {
    Over,
    Under,
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetSide::Over => write!(f, "OVER"),
            BetSide::Under => write!(f, "UNDER"),
        }
    }
}

impl std::str::FromStr for BetSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "over" | "o" | "yes" | "y" => Ok(BetSide::Over),
            "under" | "u" | "no" | "n" => Ok(BetSide::Under),
            _ => Err(anyhow::anyhow!("Unknown bet side: {s}")),
        }
    }
}

/// The proposition a wager is settled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineValue {
    /// Numeric threshold, e.g. 1.5 total bases.
    Threshold(Decimal),
    /// Yes/no proposition ("records a stolen base").
    Proposition,
}

impl LineValue {
    pub fn threshold(&self) -> Option<Decimal> {
        match self {
            LineValue::Threshold(v) => Some(*v),
            LineValue::Proposition => None,
        }
    }

    /// A whole-number line is the only kind that can land exactly on the result.
    pub fn is_whole(&self) -> bool {
        match self {
            LineValue::Threshold(v) => v.fract().is_zero(),
            LineValue::Proposition => false,
        }
    }
}

impl fmt::Display for LineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineValue::Threshold(v) => write!(f, "{}", v.normalize()),
            LineValue::Proposition => write!(f, "yes/no"),
        }
    }
}

/// Settlement outcome of a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Push,
    Unresolved,
}

impl Outcome {
    /// Win, loss and push are final; only `Unresolved` is retried.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Unresolved)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
            Outcome::Push => write!(f, "PUSH"),
            Outcome::Unresolved => write!(f, "UNRESOLVED"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" | "w" | "won" => Ok(Outcome::Win),
            "loss" | "l" | "lost" | "lose" => Ok(Outcome::Loss),
            "push" | "p" => Ok(Outcome::Push),
            "unresolved" | "pending" => Ok(Outcome::Unresolved),
            _ => Err(anyhow::anyhow!("Unknown outcome: {s}")),
        }
    }
}

/// Expected-value band. `A` is the weakest edge, `E` the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvTier {
    A,
    B,
    C,
    D,
    E,
}

impl EvTier {
    pub const ALL: &'static [EvTier] = &[EvTier::A, EvTier::B, EvTier::C, EvTier::D, EvTier::E];
}

impl fmt::Display for EvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            EvTier::A => "A",
            EvTier::B => "B",
            EvTier::C => "C",
            EvTier::D => "D",
            EvTier::E => "E",
        };
        write!(f, "{letter}")
    }
}

impl std::str::FromStr for EvTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(EvTier::A),
            "B" => Ok(EvTier::B),
            "C" => Ok(EvTier::C),
            "D" => Ok(EvTier::D),
            "E" => Ok(EvTier::E),
            _ => Err(anyhow::anyhow!("Unknown EV tier: {s}")),
        }
    }
}

/// Completion status of the game a box score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum GameStatus {
    Final,
    InProgress,
    Postponed,
    #[default]
    Unknown,
}

impl From<String> for GameStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "final" | "completed" | "complete" | "game over" => GameStatus::Final,
            "in progress" | "live" | "delayed" => GameStatus::InProgress,
            "postponed" | "cancelled" | "canceled" | "suspended" => GameStatus::Postponed,
            _ => GameStatus::Unknown,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Final => write!(f, "final"),
            GameStatus::InProgress => write!(f, "in progress"),
            GameStatus::Postponed => write!(f, "postponed"),
            GameStatus::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Box scores
// ---------------------------------------------------------------------------

/// Counting stats for one player in one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    // Batting
    pub at_bats: u32,
    pub hits: u32,
    pub runs: u32,
    pub rbi: u32,
    pub home_runs: u32,
    pub doubles: u32,
    pub triples: u32,
    pub singles: u32,
    pub walks: u32,
    pub strikeouts: u32,
    pub stolen_bases: u32,
    pub caught_stealing: u32,
    pub total_bases: u32,
    // Pitching
    pub pitching_outs: u32,
    pub hits_allowed: u32,
    pub earned_runs: u32,
    pub walks_allowed: u32,
    pub strikeouts_pitched: u32,
    pub home_runs_allowed: u32,
    // Fielding
    pub fielding_assists: u32,
    pub fielding_putouts: u32,
    pub fielding_errors: u32,
}

/// Names a single counter of a [`StatLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    AtBats,
    Hits,
    Runs,
    Rbi,
    HomeRuns,
    Doubles,
    Triples,
    Singles,
    Walks,
    Strikeouts,
    StolenBases,
    CaughtStealing,
    TotalBases,
    PitchingOuts,
    HitsAllowed,
    EarnedRuns,
    WalksAllowed,
    StrikeoutsPitched,
    HomeRunsAllowed,
    FieldingAssists,
    FieldingPutouts,
    FieldingErrors,
}

impl StatField {
    pub fn read(&self, stats: &StatLine) -> u32 {
        match self {
            StatField::AtBats => stats.at_bats,
            StatField::Hits => stats.hits,
            StatField::Runs => stats.runs,
            StatField::Rbi => stats.rbi,
            StatField::HomeRuns => stats.home_runs,
            StatField::Doubles => stats.doubles,
            StatField::Triples => stats.triples,
            StatField::Singles => stats.singles,
            StatField::Walks => stats.walks,
            StatField::Strikeouts => stats.strikeouts,
            StatField::StolenBases => stats.stolen_bases,
            StatField::CaughtStealing => stats.caught_stealing,
            StatField::TotalBases => stats.total_bases,
            StatField::PitchingOuts => stats.pitching_outs,
            StatField::HitsAllowed => stats.hits_allowed,
            StatField::EarnedRuns => stats.earned_runs,
            StatField::WalksAllowed => stats.walks_allowed,
            StatField::StrikeoutsPitched => stats.strikeouts_pitched,
            StatField::HomeRunsAllowed => stats.home_runs_allowed,
            StatField::FieldingAssists => stats.fielding_assists,
            StatField::FieldingPutouts => stats.fielding_putouts,
            StatField::FieldingErrors => stats.fielding_errors,
        }
    }
}

/// One player's line from one completed (or not) game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreRecord {
    /// Player name as reported by the stats source (canonical spelling).
    pub player: String,
    #[serde(default)]
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team: String,
    #[serde(default)]
    pub game_status: GameStatus,
    #[serde(flatten)]
    pub stats: StatLine,
    /// "mlb_api", "espn", "manual", ...
    #[serde(default)]
    pub data_source: Option<String>,
}

impl BoxScoreRecord {
    pub fn canonical(&self) -> CanonicalPlayer {
        CanonicalPlayer::new(self.player.clone())
    }
}

// ---------------------------------------------------------------------------
// Wagers
// ---------------------------------------------------------------------------

/// A wager as produced by upstream odds processing. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: String,
    /// Player name as scraped from the sportsbook.
    pub player: String,
    #[serde(default)]
    pub team: Option<String>,
    pub market_type: MarketType,
    pub line: LineValue,
    pub side: BetSide,
    pub payout_odds: AmericanOdds,
    pub sportsbook: String,
    pub expected_value_tier: EvTier,
    /// Upstream fair-probability estimate, when it was carried through.
    #[serde(default)]
    pub fair_probability: Option<Decimal>,
    pub observation_date: NaiveDate,
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} {} ({}) @ {} tier {}",
            self.observation_date,
            self.player,
            self.market_type,
            self.side,
            self.line,
            self.payout_odds,
            self.sportsbook,
            self.expected_value_tier,
        )
    }
}

/// Who settled a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    #[default]
    BoxScore,
    Manual,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::BoxScore => write!(f, "box_score_auto"),
            ResolutionSource::Manual => write!(f, "manual"),
        }
    }
}

/// A wager plus everything the resolver writes back for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWager {
    pub wager: Wager,
    pub outcome: Outcome,
    /// Trust in the automated determination (0.0–1.0). Audit metadata only.
    pub confidence: f64,
    pub actual_stat_value: Option<Decimal>,
    pub canonical_player: Option<CanonicalPlayer>,
    /// `None` when the name never resolved.
    pub name_match: Option<MappingType>,
    pub stake: Decimal,
    pub stake_tier: String,
    /// `None` while unresolved.
    pub profit_loss: Option<Decimal>,
    pub needs_review: bool,
    #[serde(default)]
    pub source: ResolutionSource,
    pub resolved_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ResolvedWager {
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Whether two resolutions agree on everything derived from the inputs.
    ///
    /// Stat values are compared at six places: persisted decimals go
    /// through `f64`, which cannot hold an exact third of an inning.
    pub fn same_result(&self, other: &ResolvedWager) -> bool {
        let actual = |r: &ResolvedWager| r.actual_stat_value.map(|v| v.round_dp(6));
        self.outcome == other.outcome
            && actual(self) == actual(other)
            && self.profit_loss == other.profit_loss
    }
}

impl fmt::Display for ResolvedWager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actual = self
            .actual_stat_value
            .map(|v| v.normalize().to_string())
            .unwrap_or_else(|| "-".to_string());
        let pnl = self
            .profit_loss
            .map(|v| format!("${v:+.2}"))
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} {} {} {} → {} (actual {}) stake ${:.0} P/L {} conf={:.0}%{}",
            self.wager.player,
            self.wager.market_type,
            self.wager.side,
            self.wager.line,
            self.outcome,
            actual,
            self.stake,
            pnl,
            self.confidence * 100.0,
            if self.needs_review { " [REVIEW]" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Per-wager failures. None of these abort a batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WagerError {
    #[error("Name not resolved: {player} ({date})")]
    NameNotResolved { player: String, date: NaiveDate },

    #[error("No box score for {player} on {date}")]
    BoxScoreMissing { player: String, date: NaiveDate },

    #[error("Game not final for {player} on {date}: {status}")]
    GameNotFinal { player: String, date: NaiveDate, status: GameStatus },

    #[error("Unsupported market type: {0}")]
    UnsupportedMarketType(String),

    #[error("Malformed odds string: {0:?}")]
    MalformedOddsString(String),

    #[error("Malformed observation date: {0:?}")]
    MalformedDate(String),

    #[error("Malformed line for {market}: {detail}")]
    MalformedLine { market: String, detail: String },

    #[error("Wager {0} carries neither an EV tier nor a fair probability")]
    MissingEvTier(String),

    #[error("Fair probability outside (0, 1): {0}")]
    InvalidProbability(Decimal),

    #[error("Game completion status ambiguous for {player} on {date}")]
    AmbiguousGameCompletion { player: String, date: NaiveDate },

    #[error("Malformed wager record: {0}")]
    MalformedRecord(String),

    #[error("{player} on {date} matches box scores for several teams ({teams})")]
    AmbiguousPlayer { player: String, date: NaiveDate, teams: String },
}

impl WagerError {
    /// Whether the wager stays eligible for a later resolution run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WagerError::NameNotResolved { .. }
                | WagerError::BoxScoreMissing { .. }
                | WagerError::GameNotFinal { .. }
                | WagerError::AmbiguousPlayer { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
