//! Shared fixtures: one slate of wagers and the box scores that settle it.

use chrono::NaiveDate;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use propsettle::engine::ingest::{Ingestor, RawWager};
use propsettle::engine::resolver::{
    BoxScoreIndex, Ledger, ResolutionConfig, ResolutionEngine, ResolutionMode, RunSummary,
};
use propsettle::markets::MarketRegistry;
use propsettle::names::{NameConfig, NameNormalizer, NameRepository};
use propsettle::strategy::Pricing;
use propsettle::types::{BoxScoreRecord, Wager};

pub fn slate_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 26).unwrap()
}

pub const WAGERS_JSON: &str = r#"[
    {"id": "judge-tb", "player": "Aaron Judge", "team": "NYY", "market": "Total Bases",
     "line": 1.5, "side": "Over", "odds": "+150", "sportsbook": "FanDuel",
     "ev_tier": "E", "observation_date": "2025-06-26"},
    {"id": "soto-hits", "player": "Juan Soto", "market": "Hits", "line": 1.5, "side": "Over",
     "odds": -120, "sportsbook": "DraftKings", "fair_probability": 0.6,
     "observation_date": "06/26/2025"},
    {"id": "smith-ip", "player": "Jon Smith", "market": "Innings Pitched", "line": 5.5,
     "side": "Over", "odds": "-110", "sportsbook": "BetMGM", "ev_tier": "B",
     "observation_date": "Jun 26"},
    {"id": "ohtani-hr", "player": "Shohei Ohtani", "market": "Anytime Home Run",
     "odds": "+300", "sportsbook": "FanDuel", "ev_tier": "D", "observation_date": "2025-06-26"},
    {"id": "cole-k", "player": "Gerrit Cole", "market": "Strikeouts", "line": 6, "side": "Over",
     "odds": -105, "sportsbook": "Caesars", "ev_tier": "A", "observation_date": "2025-06-26"},
    {"id": "betts-runs", "player": "Mookie Betts", "market": "Runs", "line": 0.5, "side": "Over",
     "odds": "+110", "sportsbook": "FanDuel", "ev_tier": "C", "observation_date": "2025-06-26"},
    {"id": "nobody", "player": "Zzyzx Nobody", "market": "Hits", "line": 0.5, "side": "Over",
     "odds": "+800", "sportsbook": "FanDuel", "ev_tier": "C", "observation_date": "2025-06-26"},
    {"id": "curling", "player": "Aaron Judge", "market": "Curling Stones", "line": 0.5,
     "side": "Over", "odds": "+100", "sportsbook": "FanDuel", "ev_tier": "C",
     "observation_date": "2025-06-26"},
    {"id": "judge-tb", "player": "Aaron Judge", "team": "NYY", "market": "Total Bases",
     "line": 1.5, "side": "Over", "odds": "+150", "sportsbook": "FanDuel",
     "ev_tier": "E", "observation_date": "2025-06-26"}
]"#;

/// Box scores with Betts' game still in progress.
pub const BOX_SCORES_JSON: &str = r#"[
    {"player": "Aaron Judge", "game_id": "g1", "game_date": "2025-06-26", "team": "NYY",
     "game_status": "Final", "total_bases": 3, "hits": 2},
    {"player": "Juan Soto", "game_id": "g2", "game_date": "2025-06-26", "team": "NYM",
     "game_status": "Final", "hits": 1},
    {"player": "Jonathan Smith", "game_id": "g3", "game_date": "2025-06-26", "team": "BOS",
     "game_status": "Final", "pitching_outs": 17},
    {"player": "Shohei Ohtani", "game_id": "g4", "game_date": "2025-06-26", "team": "LAD",
     "game_status": "Final", "home_runs": 0, "hits": 1},
    {"player": "Gerrit Cole", "game_id": "g1", "game_date": "2025-06-26", "team": "NYY",
     "game_status": "Final", "strikeouts_pitched": 6},
    {"player": "Mookie Betts", "game_id": "g4", "game_date": "2025-06-26", "team": "LAD",
     "game_status": "In Progress", "runs": 0}
]"#;

pub fn raw_wagers() -> Vec<RawWager> {
    serde_json::from_str(WAGERS_JSON).unwrap()
}

pub fn box_scores() -> Vec<BoxScoreRecord> {
    serde_json::from_str(BOX_SCORES_JSON).unwrap()
}

/// Same slate once Betts' game went final.
pub fn final_box_scores() -> Vec<BoxScoreRecord> {
    let mut records = box_scores();
    for r in records.iter_mut().filter(|r| r.player == "Mookie Betts") {
        r.game_status = propsettle::types::GameStatus::Final;
        r.stats.runs = 1;
    }
    records
}

pub fn ingest(pricing: &Pricing, markets: &MarketRegistry) -> Vec<Wager> {
    let report = Ingestor::new(pricing, markets, slate_date()).ingest(&raw_wagers());
    report.accepted
}

pub fn engine(repo: Arc<dyn NameRepository>) -> ResolutionEngine {
    ResolutionEngine::new(
        NameNormalizer::new(repo, NameConfig::default()),
        MarketRegistry::default(),
        Pricing::default(),
        ResolutionConfig::default(),
    )
}

pub fn run(
    engine: &ResolutionEngine,
    wagers: &[Wager],
    records: Vec<BoxScoreRecord>,
    ledger: &mut Ledger,
    mode: ResolutionMode,
) -> RunSummary {
    let index = BoxScoreIndex::build(records, engine.names().repository().as_ref());
    engine.resolve_batch(wagers, &index, ledger, mode, &AtomicBool::new(false))
}

pub fn temp_path(name: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("propsettle_it_{name}_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}
