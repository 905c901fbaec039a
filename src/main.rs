//! PROPSETTLE: Player-prop bet resolution and tiered ROI engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the name table and ledger from disk, resolves the current
//! wager batch against the current box scores, and reports ROI.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use propsettle::config;
use propsettle::engine::accountant::Accountant;
use propsettle::engine::ingest::Ingestor;
use propsettle::engine::resolver::{resolution_summary, BoxScoreIndex, ResolutionEngine, RunSummary};
use propsettle::markets::MarketRegistry;
use propsettle::names::{InMemoryNameRepository, NameNormalizer, NameRepository};
use propsettle::storage;
use propsettle::strategy::ev::EvClassifier;
use propsettle::strategy::staking::StakeCalculator;
use propsettle::strategy::Pricing;

const BANNER: &str = r#"
 ___ ___  ___  ___  ___ ___ _____ _____ _    ___
| _ \ _ \/ _ \| _ \/ __| __|_   _|_   _| |  | __|
|  _/   / (_) |  _/\__ \ _|  | |   | | | |__| _|
|_| |_|_\\___/|_|  |___/___| |_|   |_| |____|___|

  Player-prop bet resolution and tiered ROI engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("PROPSETTLE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        mode = %cfg.mode(),
        range = %cfg.report_range(),
        "PROPSETTLE starting up"
    );

    // -- Restore state ---------------------------------------------------

    let mappings = storage::load_name_mappings(&cfg.run.name_mappings_path)?;
    let repo = Arc::new(InMemoryNameRepository::from_mappings(mappings));
    let mut ledger = storage::load_ledger(&cfg.run.ledger_path)?;

    // -- Initialise components -------------------------------------------

    let pricing = Pricing::new(
        EvClassifier::new(cfg.ev_tiers.clone()),
        StakeCalculator::new(cfg.staking.clone()),
    );
    let markets = MarketRegistry::new(&cfg.market_rules);
    let reference_date = cfg
        .run
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());

    // -- Ingest ----------------------------------------------------------

    let raw = storage::load_wagers(&cfg.run.wagers_path)?;
    let report = Ingestor::new(&pricing, &markets, reference_date).ingest_json(&raw);
    for item in &report.rejected {
        warn!(target: "propsettle::curation", %item, "Rejected record");
    }

    let box_scores = storage::load_box_scores(&cfg.run.box_scores_path)?;
    let index = BoxScoreIndex::build(box_scores, repo.as_ref());
    info!(box_scores = index.len(), "Box-score index built");

    // -- Resolve ---------------------------------------------------------

    let engine = ResolutionEngine::new(
        NameNormalizer::new(repo.clone(), cfg.names.clone()),
        markets,
        pricing,
        cfg.resolution.clone(),
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, finishing current wager");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let mode = cfg.mode();
    let wagers = report.accepted;
    let (engine, ledger, summary) = tokio::task::spawn_blocking(move || {
        let summary = engine.resolve_batch(&wagers, &index, &mut ledger, mode, &cancel);
        (engine, ledger, summary)
    })
    .await
    .context("Resolution task panicked")?;

    // -- Persist ---------------------------------------------------------

    storage::save_ledger(&ledger, &cfg.run.ledger_path)?;
    storage::save_name_mappings(&repo.mappings(), &cfg.run.name_mappings_path)?;

    // -- Report ----------------------------------------------------------

    log_run_summary(&summary);

    let resolution = resolution_summary(ledger.values(), None);
    info!(
        total = resolution.total_resolved,
        auto = resolution.auto_resolved,
        manual = resolution.manual_resolved,
        needs_review = resolution.needs_review,
        avg_confidence = ?resolution.average_confidence,
        "Resolution summary"
    );

    let roi = Accountant::summarize(ledger.values(), cfg.report_range(), engine.pricing());
    println!("{roi}");

    info!(
        entries = ledger.len(),
        cancelled = summary.cancelled,
        "PROPSETTLE shut down cleanly."
    );

    Ok(())
}

/// Log the run counts, then every flagged item for curation.
fn log_run_summary(summary: &RunSummary) {
    info!(%summary, "Run complete");
    for item in &summary.flagged {
        warn!(target: "propsettle::curation", %item, "Flagged for review");
    }
    if !summary.unmatched_names.is_empty() {
        warn!(
            target: "propsettle::curation",
            names = ?summary.unmatched_names,
            "Unmatched player names need a manual mapping"
        );
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("propsettle=info"));

    let json_logging = std::env::var("PROPSETTLE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
