//! Ingest → resolve → persist → resolve again.

use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use propsettle::engine::ingest::Ingestor;
use propsettle::engine::resolver::{BoxScoreIndex, Ledger, ResolutionMode};
use propsettle::engine::FlagKind;
use propsettle::markets::MarketRegistry;
use propsettle::names::{InMemoryNameRepository, NameRepository};
use propsettle::storage;
use propsettle::strategy::Pricing;
use propsettle::types::{EvTier, LineValue, MappingType, MarketType, Outcome, ResolutionSource};

use crate::common::{self, engine, final_box_scores, run, slate_date, temp_path};

#[test]
fn test_ingest_report() {
    let pricing = Pricing::default();
    let markets = MarketRegistry::default();
    let report = Ingestor::new(&pricing, &markets, slate_date()).ingest(&common::raw_wagers());

    assert_eq!(report.accepted.len(), 7);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].wager_id, "curling");
    assert_eq!(report.rejected[0].kind, FlagKind::Rejected);

    let soto = report.accepted.iter().find(|w| w.id == "soto-hits").unwrap();
    assert_eq!(soto.expected_value_tier, EvTier::D);

    let ohtani = report.accepted.iter().find(|w| w.id == "ohtani-hr").unwrap();
    assert_eq!(ohtani.market_type, MarketType::ToHitHomeRun);
    assert_eq!(ohtani.line, LineValue::Proposition);

    assert!(report.accepted.iter().all(|w| w.observation_date == slate_date()));
}

#[test]
fn test_first_run_settles_final_games() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo.clone());
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    let summary = run(&engine, &wagers, common::box_scores(), &mut ledger, ResolutionMode::Normal);

    assert_eq!(summary.total, 7);
    assert_eq!(summary.resolved, 5);
    assert_eq!(summary.unresolved, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.unmatched_names, vec!["Zzyzx Nobody".to_string()]);
    assert!(summary
        .flagged
        .iter()
        .any(|f| f.wager_id == "betts-runs" && f.kind == FlagKind::Unresolved));
    assert_eq!(ledger.len(), 7);

    let judge = &ledger["judge-tb"];
    assert_eq!(judge.outcome, Outcome::Win);
    assert_eq!(judge.profit_loss, Some(dec!(150)));
    assert!((judge.confidence - 0.95).abs() < 1e-9);

    let smith = &ledger["smith-ip"];
    assert_eq!(smith.outcome, Outcome::Win);
    assert_eq!(smith.name_match, Some(MappingType::Fuzzy));
    assert_eq!(smith.canonical_player.as_ref().unwrap().name(), "Jonathan Smith");
    assert_eq!(smith.profit_loss, Some(dec!(90.91)));
    assert!((smith.confidence - 0.80).abs() < 1e-9);
    assert!(!smith.needs_review);

    let ohtani = &ledger["ohtani-hr"];
    assert_eq!(ohtani.outcome, Outcome::Loss);
    assert_eq!(ohtani.stake, dec!(50));
    assert_eq!(ohtani.profit_loss, Some(dec!(-50)));

    let cole = &ledger["cole-k"];
    assert_eq!(cole.outcome, Outcome::Push);
    assert_eq!(cole.profit_loss, Some(dec!(0)));

    let betts = &ledger["betts-runs"];
    assert_eq!(betts.outcome, Outcome::Unresolved);
    assert_eq!(betts.profit_loss, None);

    let nobody = &ledger["nobody"];
    assert_eq!(nobody.outcome, Outcome::Unresolved);
    assert_eq!(nobody.stake, dec!(15));

    // The fuzzy match was learned.
    let learned = repo.lookup("jon smith").unwrap();
    assert_eq!(learned.mapping_type, MappingType::Fuzzy);
}

#[test]
fn test_rerun_only_picks_up_open_wagers() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    run(&engine, &wagers, common::box_scores(), &mut ledger, ResolutionMode::Normal);
    let before = ledger.clone();

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
    assert_eq!(summary.already_resolved, 5);
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.unresolved, 1);

    let betts = &ledger["betts-runs"];
    assert_eq!(betts.outcome, Outcome::Win);
    assert_eq!(betts.profit_loss, Some(dec!(110)));

    for (id, prev) in before.iter().filter(|(_, r)| r.is_terminal()) {
        assert_eq!(&ledger[id], prev, "terminal result {id} was rewritten");
    }
}

#[test]
fn test_idempotent_across_persistence() {
    let ledger_path = temp_path("ledger");
    let names_path = temp_path("names");

    let first = {
        let repo = Arc::new(InMemoryNameRepository::new());
        let engine = engine(repo.clone());
        let wagers = common::ingest(engine.pricing(), engine.markets());
        let mut ledger = Ledger::new();
        run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
        storage::save_ledger(&ledger, &ledger_path).unwrap();
        storage::save_name_mappings(&repo.mappings(), &names_path).unwrap();
        ledger
    };

    let mappings = storage::load_name_mappings(&names_path).unwrap();
    let repo = Arc::new(InMemoryNameRepository::from_mappings(mappings));
    let engine = engine(repo.clone());
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = storage::load_ledger(&ledger_path).unwrap();

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
    assert_eq!(summary.already_resolved, 6);
    assert_eq!(summary.resolved, 0);
    assert_eq!(summary.corrected, 0);

    // A correction pass over unchanged inputs changes nothing either.
    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Correction);
    assert_eq!(summary.corrected, 0);
    assert_eq!(summary.resolved, 6);

    for (id, r) in &first {
        assert!(ledger[id].same_result(r), "result for {id} drifted");
    }
    assert_eq!(
        repo.lookup("jon smith").map(|m| m.mapping_type),
        Some(MappingType::Fuzzy)
    );

    storage::delete_file(&ledger_path).unwrap();
    storage::delete_file(&names_path).unwrap();
}

#[test]
fn test_correction_mode_fixes_bad_stats() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    let mut wrong = final_box_scores();
    for r in wrong.iter_mut().filter(|r| r.player == "Aaron Judge") {
        r.stats.total_bases = 1;
    }
    run(&engine, &wagers, wrong, &mut ledger, ResolutionMode::Normal);
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Loss);

    // Normal mode leaves terminal results alone.
    run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Loss);

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Correction);
    assert_eq!(summary.corrected, 1);
    assert!(summary
        .flagged
        .iter()
        .any(|f| f.wager_id == "judge-tb" && f.kind == FlagKind::Corrected));
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Win);
    assert_eq!(ledger["judge-tb"].profit_loss, Some(dec!(150)));
}

#[test]
fn test_correction_never_regresses_terminal_result() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);

    // Box scores for the slate are gone on the correction pass.
    let summary = run(&engine, &wagers, Vec::new(), &mut ledger, ResolutionMode::Correction);
    assert_eq!(summary.corrected, 0);
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Win);
    assert_eq!(ledger["betts-runs"].outcome, Outcome::Win);
}

#[test]
fn test_manual_settlement_survives_correction() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);
    assert_eq!(ledger["nobody"].outcome, Outcome::Unresolved);

    let nobody = wagers.iter().find(|w| w.id == "nobody").unwrap();
    let settled = engine
        .settle_manually(nobody, Outcome::Win, Some(dec!(2)), Some("checked by hand".into()), &mut ledger)
        .unwrap();
    assert_eq!(settled.source, ResolutionSource::Manual);
    assert_eq!(settled.profit_loss, Some(dec!(120)));

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Correction);
    assert_eq!(summary.unmatched_names, Vec::<String>::new());
    assert_eq!(ledger["nobody"].outcome, Outcome::Win);
    assert_eq!(ledger["nobody"].source, ResolutionSource::Manual);
}

#[test]
fn test_cancel_before_start_leaves_ledger_untouched() {
    let repo = Arc::new(InMemoryNameRepository::new());
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    let index = BoxScoreIndex::build(final_box_scores(), engine.names().repository().as_ref());
    let cancel = AtomicBool::new(true);
    let summary = engine.resolve_batch(&wagers, &index, &mut ledger, ResolutionMode::Normal, &cancel);

    assert!(summary.cancelled);
    assert!(ledger.is_empty());
}

#[test]
fn test_broken_record_in_input_file_rejected_alone() {
    let path = temp_path("wagers");
    let mut records: Vec<serde_json::Value> = serde_json::from_str(common::WAGERS_JSON).unwrap();
    records[0].as_object_mut().unwrap().remove("market");
    std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

    let pricing = Pricing::default();
    let markets = MarketRegistry::default();
    let loaded = storage::load_wagers(&path).unwrap();
    let report = Ingestor::new(&pricing, &markets, slate_date()).ingest_json(&loaded);

    // The duplicate judge-tb further down now counts as the first.
    assert_eq!(report.accepted.len(), 7);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].wager_id, "judge-tb");
    assert!(report.rejected[0].reason.contains("Malformed wager record"));
    assert_eq!(report.rejected[1].wager_id, "curling");

    storage::delete_file(&path).unwrap();
}
