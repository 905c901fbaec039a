//! Resolution through a caller-supplied name repository.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use propsettle::engine::resolver::{BoxScoreIndex, Ledger, ResolutionMode};
use propsettle::names::{normalize_key, InMemoryNameRepository, NameMapping, NameRepository};
use propsettle::types::{CanonicalPlayer, MappingType, Outcome};

use crate::common::{self, engine, final_box_scores, run};

/// Read-only roster and curated mappings. Writes are recorded, never kept.
struct FixedNameRepository {
    roster: Vec<CanonicalPlayer>,
    curated: HashMap<String, NameMapping>,
    writes: Mutex<Vec<NameMapping>>,
}

impl FixedNameRepository {
    fn new(roster: &[&str], curated: &[(&str, &str)]) -> Self {
        Self {
            roster: roster.iter().map(|n| CanonicalPlayer::new(*n)).collect(),
            curated: curated
                .iter()
                .map(|(variant, canonical)| {
                    let m = NameMapping::new(variant, CanonicalPlayer::new(*canonical), MappingType::Manual, 1.0);
                    (m.variant_key.clone(), m)
                })
                .collect(),
            writes: Mutex::new(Vec::new()),
        }
    }
}

impl NameRepository for FixedNameRepository {
    fn lookup(&self, variant_key: &str) -> Option<NameMapping> {
        self.curated.get(variant_key).cloned()
    }

    fn upsert(&self, mapping: NameMapping) -> NameMapping {
        self.writes.lock().push(mapping.clone());
        mapping
    }

    fn register_canonical(&self, _player: CanonicalPlayer) {}

    fn find_canonical(&self, key: &str) -> Option<CanonicalPlayer> {
        self.roster.iter().find(|p| p.key() == key).cloned()
    }

    fn canonical_names(&self) -> Vec<CanonicalPlayer> {
        self.roster.clone()
    }

    fn mappings(&self) -> Vec<NameMapping> {
        self.curated.values().cloned().collect()
    }
}

/// In-memory names that raise a cancel flag once the given lookup is served,
/// the way ctrl-c lands in the middle of a run.
struct CancellingNameRepository {
    inner: InMemoryNameRepository,
    cancel: Arc<AtomicBool>,
    cancel_on_lookup: usize,
    lookups: AtomicUsize,
}

impl CancellingNameRepository {
    fn new(cancel: Arc<AtomicBool>, cancel_on_lookup: usize) -> Self {
        Self {
            inner: InMemoryNameRepository::new(),
            cancel,
            cancel_on_lookup,
            lookups: AtomicUsize::new(0),
        }
    }
}

impl NameRepository for CancellingNameRepository {
    fn lookup(&self, variant_key: &str) -> Option<NameMapping> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_on_lookup {
            self.cancel.store(true, Ordering::SeqCst);
        }
        self.inner.lookup(variant_key)
    }

    fn upsert(&self, mapping: NameMapping) -> NameMapping {
        self.inner.upsert(mapping)
    }

    fn register_canonical(&self, player: CanonicalPlayer) {
        self.inner.register_canonical(player)
    }

    fn find_canonical(&self, key: &str) -> Option<CanonicalPlayer> {
        self.inner.find_canonical(key)
    }

    fn canonical_names(&self) -> Vec<CanonicalPlayer> {
        self.inner.canonical_names()
    }

    fn mappings(&self) -> Vec<NameMapping> {
        self.inner.mappings()
    }
}

#[test]
fn test_cancel_mid_run_keeps_finished_wagers() {
    let cancel = Arc::new(AtomicBool::new(false));
    let repo = Arc::new(CancellingNameRepository::new(cancel.clone(), 2));
    let engine = engine(repo.clone());
    let wagers = common::ingest(engine.pricing(), engine.markets());
    assert_eq!(wagers[0].id, "judge-tb");
    assert_eq!(wagers[1].id, "soto-hits");

    let index = BoxScoreIndex::build(final_box_scores(), repo.as_ref());
    let mut ledger = Ledger::new();
    let summary = engine.resolve_batch(&wagers, &index, &mut ledger, ResolutionMode::Normal, &cancel);

    // The wager in flight when the flag went up still finishes.
    assert!(summary.cancelled);
    assert_eq!(summary.resolved, 2);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Win);
    assert_eq!(ledger["soto-hits"].outcome, Outcome::Loss);
    for w in &wagers[2..] {
        assert!(!ledger.contains_key(&w.id), "{} should not have been attempted", w.id);
    }

    // The next run picks up where the cancelled one stopped.
    let follow_up = AtomicBool::new(false);
    let summary = engine.resolve_batch(&wagers, &index, &mut ledger, ResolutionMode::Normal, &follow_up);
    assert!(!summary.cancelled);
    assert_eq!(summary.already_resolved, 2);
    assert_eq!(summary.resolved, 4);
    assert_eq!(ledger.len(), wagers.len());
    assert_eq!(ledger["smith-ip"].outcome, Outcome::Win);
    assert_eq!(ledger["nobody"].outcome, Outcome::Unresolved);
}

#[test]
fn test_curated_mapping_resolves_unknown_spelling() {
    let repo = Arc::new(FixedNameRepository::new(
        &["Aaron Judge", "Juan Soto", "Jonathan Smith", "Shohei Ohtani", "Gerrit Cole", "Mookie Betts"],
        &[("Zzyzx Nobody", "Aaron Judge")],
    ));
    let engine = engine(repo.clone());
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);

    assert!(summary.unmatched_names.is_empty());
    assert_eq!(summary.resolved, 7);

    let nobody = &ledger["nobody"];
    assert_eq!(nobody.name_match, Some(MappingType::Manual));
    assert_eq!(nobody.canonical_player, Some(CanonicalPlayer::new("Aaron Judge")));
    // Judge had two hits against a 0.5 line.
    assert_eq!(nobody.outcome, Outcome::Win);
    assert!((nobody.confidence - 0.95).abs() < 1e-9);

    // Only the one fuzzy spelling was offered back for storage.
    let writes = repo.writes.lock();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].variant_key, normalize_key("Jon Smith"));
    assert_eq!(writes[0].mapping_type, MappingType::Fuzzy);
}

#[test]
fn test_roster_without_player_leaves_wager_open() {
    let repo = Arc::new(FixedNameRepository::new(&["Aaron Judge"], &[]));
    let engine = engine(repo);
    let wagers = common::ingest(engine.pricing(), engine.markets());
    let mut ledger = Ledger::new();

    let summary = run(&engine, &wagers, final_box_scores(), &mut ledger, ResolutionMode::Normal);

    assert_eq!(summary.resolved, 1);
    assert_eq!(ledger["judge-tb"].outcome, Outcome::Win);
    assert_eq!(ledger["soto-hits"].outcome, Outcome::Unresolved);
    assert!(summary.unmatched_names.contains(&"Juan Soto".to_string()));
}
