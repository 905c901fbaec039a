//! Name normalizer: ties scraped player names to one canonical identity.
//!
//! Sportsbooks and stats providers spell players differently ("Jon Smith",
//! "Jonathan Smith", "Ronald Acuña Jr."). Every raw name goes through
//! [`NameNormalizer::normalize`], which tries the mapping table, then the
//! canonical roster, then a fuzzy match whose result is written back so the
//! next lookup is exact.

use chrono::{DateTime, NaiveDate, Utc};
use deunicode::deunicode;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use strsim::jaro_winkler;
use tracing::{debug, info, warn};

use crate::types::{CanonicalPlayer, MappingType};

// ---------------------------------------------------------------------------
// Key normalization
// ---------------------------------------------------------------------------

/// Reduce a display name to its join key.
///
/// ASCII-transliterated, lowercase, punctuation removed, generational
/// suffix dropped, single-spaced. `"Ronald Acuña Jr."` → `"ronald acuna"`.
pub fn normalize_key(raw: &str) -> String {
    static PUNCT_RE: OnceLock<Regex> = OnceLock::new();
    static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();

    let punct = PUNCT_RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    let suffix = SUFFIX_RE.get_or_init(|| Regex::new(r"\s+(jr|sr|ii|iii|iv)$").unwrap());

    let ascii = deunicode(raw).to_lowercase().replace('-', " ");
    let no_punct = punct.replace_all(&ascii, "");
    let collapsed = no_punct.split_whitespace().collect::<Vec<_>>().join(" ");

    suffix.replace(&collapsed, "").trim().to_string()
}

/// Similarity of two normalized keys in [0, 1].
///
/// The better of Jaro-Winkler over the whole key and a first/last token
/// score. In the token score an abbreviated first name ("jon", "j") counts
/// as a strong match, but the last names must already be near-identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    jaro_winkler(a, b).max(token_score(a, b))
}

const LAST_NAME_GATE: f64 = 0.95;
const PREFIX_SCORE: f64 = 0.9;

fn token_score(a: &str, b: &str) -> f64 {
    let (Some((a_first, a_last)), Some((b_first, b_last))) = (split_name(a), split_name(b)) else {
        return 0.0;
    };

    let last = if a_last == b_last { 1.0 } else { jaro_winkler(a_last, b_last) };
    if last < LAST_NAME_GATE {
        return 0.0;
    }

    let first = if a_first == b_first {
        1.0
    } else if a_first.starts_with(b_first) || b_first.starts_with(a_first) {
        PREFIX_SCORE
    } else {
        jaro_winkler(a_first, b_first)
    };

    (first + last) / 2.0
}

fn split_name(key: &str) -> Option<(&str, &str)> {
    let mut tokens = key.split(' ');
    let first = tokens.next()?;
    let last = tokens.last()?;
    Some((first, last))
}

// ---------------------------------------------------------------------------
// Mapping table
// ---------------------------------------------------------------------------

/// One learned or curated spelling of a canonical player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMapping {
    pub canonical: CanonicalPlayer,
    /// Raw spelling as first seen.
    pub variant: String,
    pub variant_key: String,
    pub mapping_type: MappingType,
    pub similarity: f64,
    pub created_at: DateTime<Utc>,
}

impl NameMapping {
    pub fn new(
        variant: &str,
        canonical: CanonicalPlayer,
        mapping_type: MappingType,
        similarity: f64,
    ) -> Self {
        Self {
            canonical,
            variant: variant.trim().to_string(),
            variant_key: normalize_key(variant),
            mapping_type,
            similarity,
            created_at: Utc::now(),
        }
    }
}

/// Storage for name mappings and the canonical roster.
///
/// `upsert` is upsert-and-return: the caller always gets back the mapping
/// the repository holds after the call, which may not be the one it passed.
#[cfg_attr(test, mockall::automock)]
pub trait NameRepository: Send + Sync {
    fn lookup(&self, variant_key: &str) -> Option<NameMapping>;

    /// Manual mappings always replace. Automated mappings never replace an
    /// existing entry; the existing entry is returned instead.
    fn upsert(&self, mapping: NameMapping) -> NameMapping;

    fn register_canonical(&self, player: CanonicalPlayer);

    /// Canonical player whose key equals `key`, if any.
    fn find_canonical(&self, key: &str) -> Option<CanonicalPlayer>;

    fn canonical_names(&self) -> Vec<CanonicalPlayer>;

    fn mappings(&self) -> Vec<NameMapping>;
}

/// Lock-guarded in-process repository, persisted by `storage`.
#[derive(Default)]
pub struct InMemoryNameRepository {
    mappings: RwLock<HashMap<String, NameMapping>>,
    canonical: RwLock<BTreeMap<String, CanonicalPlayer>>,
}

impl InMemoryNameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted mappings. Each mapping's canonical player is
    /// also registered.
    pub fn from_mappings(mappings: impl IntoIterator<Item = NameMapping>) -> Self {
        let repo = Self::new();
        for mapping in mappings {
            repo.register_canonical(mapping.canonical.clone());
            repo.upsert(mapping);
        }
        repo
    }
}

impl NameRepository for InMemoryNameRepository {
    fn lookup(&self, variant_key: &str) -> Option<NameMapping> {
        self.mappings.read().get(variant_key).cloned()
    }

    fn upsert(&self, mapping: NameMapping) -> NameMapping {
        let mut table = self.mappings.write();
        if let Some(existing) = table.get(&mapping.variant_key) {
            if mapping.mapping_type.is_automated() {
                debug!(
                    variant = %mapping.variant,
                    existing = %existing.canonical,
                    existing_type = %existing.mapping_type,
                    "Mapping already present, keeping existing"
                );
                return existing.clone();
            }
        }
        table.insert(mapping.variant_key.clone(), mapping.clone());
        mapping
    }

    fn register_canonical(&self, player: CanonicalPlayer) {
        let key = player.key();
        if key.is_empty() {
            return;
        }
        self.canonical.write().entry(key).or_insert(player);
    }

    fn find_canonical(&self, key: &str) -> Option<CanonicalPlayer> {
        self.canonical.read().get(key).cloned()
    }

    fn canonical_names(&self) -> Vec<CanonicalPlayer> {
        self.canonical.read().values().cloned().collect()
    }

    fn mappings(&self) -> Vec<NameMapping> {
        let mut all: Vec<NameMapping> = self.mappings.read().values().cloned().collect();
        all.sort_by(|a, b| a.variant_key.cmp(&b.variant_key));
        all
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    /// Minimum [`similarity`] for a fuzzy match to be accepted.
    pub fuzzy_threshold: f64,
}

impl Default for NameConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: 0.88 }
    }
}

/// Result of normalizing one raw name.
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch {
    Exact(CanonicalPlayer),
    Fuzzy { player: CanonicalPlayer, score: f64 },
    Manual(CanonicalPlayer),
    NotFound,
}

impl NameMatch {
    pub fn player(&self) -> Option<&CanonicalPlayer> {
        match self {
            NameMatch::Exact(p) | NameMatch::Manual(p) => Some(p),
            NameMatch::Fuzzy { player, .. } => Some(player),
            NameMatch::NotFound => None,
        }
    }

    pub fn mapping_type(&self) -> Option<MappingType> {
        match self {
            NameMatch::Exact(_) => Some(MappingType::Exact),
            NameMatch::Fuzzy { .. } => Some(MappingType::Fuzzy),
            NameMatch::Manual(_) => Some(MappingType::Manual),
            NameMatch::NotFound => None,
        }
    }

    fn from_mapping(mapping: NameMapping) -> Self {
        match mapping.mapping_type {
            MappingType::Exact => NameMatch::Exact(mapping.canonical),
            MappingType::Manual => NameMatch::Manual(mapping.canonical),
            MappingType::Fuzzy => NameMatch::Fuzzy {
                player: mapping.canonical,
                score: mapping.similarity,
            },
        }
    }
}

/// Where a match came from; only fresh fuzzy matches get written back.
enum Found {
    Stored(NameMatch),
    FreshFuzzy { player: CanonicalPlayer, score: f64 },
    Nothing,
}

pub struct NameNormalizer {
    repo: Arc<dyn NameRepository>,
    config: NameConfig,
}

impl NameNormalizer {
    pub fn new(repo: Arc<dyn NameRepository>, config: NameConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &NameConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn NameRepository> {
        &self.repo
    }

    /// Resolve a raw name, recording any new fuzzy match.
    ///
    /// `observed_on` is only used to report names that need curation.
    pub fn normalize(&self, raw: &str, observed_on: NaiveDate) -> NameMatch {
        match self.find(raw) {
            Found::Stored(m) => m,
            Found::FreshFuzzy { player, score } => {
                let stored = self.repo.upsert(NameMapping::new(raw, player.clone(), MappingType::Fuzzy, score));
                if stored.canonical == player && stored.mapping_type == MappingType::Fuzzy {
                    info!(
                        variant = raw,
                        canonical = %player,
                        score = format!("{score:.3}"),
                        "Learned fuzzy name mapping"
                    );
                }
                NameMatch::from_mapping(stored)
            }
            Found::Nothing => {
                warn!(
                    target: "propsettle::curation",
                    player = raw,
                    date = %observed_on,
                    "No canonical match for player name"
                );
                NameMatch::NotFound
            }
        }
    }

    /// Same resolution as [`normalize`](Self::normalize) without writing.
    pub fn lookup(&self, raw: &str) -> NameMatch {
        match self.find(raw) {
            Found::Stored(m) => m,
            Found::FreshFuzzy { player, score } => NameMatch::Fuzzy { player, score },
            Found::Nothing => NameMatch::NotFound,
        }
    }

    /// Curate a mapping by hand. Replaces whatever the variant mapped to.
    pub fn add_override(&self, variant: &str, canonical: CanonicalPlayer) -> NameMapping {
        self.repo.register_canonical(canonical.clone());
        let stored = self
            .repo
            .upsert(NameMapping::new(variant, canonical, MappingType::Manual, 1.0));
        info!(variant, canonical = %stored.canonical, "Manual name override recorded");
        stored
    }

    fn find(&self, raw: &str) -> Found {
        let key = normalize_key(raw);
        if key.is_empty() {
            return Found::Nothing;
        }

        if let Some(mapping) = self.repo.lookup(&key) {
            return Found::Stored(NameMatch::from_mapping(mapping));
        }

        if let Some(player) = self.repo.find_canonical(&key) {
            return Found::Stored(NameMatch::Exact(player));
        }

        self.best_fuzzy(&key)
    }

    fn best_fuzzy(&self, key: &str) -> Found {
        let mut best: Option<(CanonicalPlayer, f64)> = None;
        let mut tied = false;

        for candidate in self.repo.canonical_names() {
            let score = similarity(key, &candidate.key());
            match &best {
                Some((_, top)) if (score - top).abs() < f64::EPSILON => tied = true,
                Some((_, top)) if score < *top => {}
                _ => {
                    best = Some((candidate, score));
                    tied = false;
                }
            }
        }

        match best {
            Some((player, score)) if score >= self.config.fuzzy_threshold && !tied => {
                Found::FreshFuzzy { player, score }
            }
            Some((player, score)) if score >= self.config.fuzzy_threshold => {
                debug!(key, candidate = %player, score, "Ambiguous fuzzy match rejected");
                Found::Nothing
            }
            _ => Found::Nothing,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
