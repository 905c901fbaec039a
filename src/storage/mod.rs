//! Persistence layer.
//!
//! Inputs (wager records, box scores) and state (name mappings, the
//! resolved-wager ledger) are JSON files. Inputs must exist; state files
//! that don't exist yet mean a fresh start.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::engine::resolver::Ledger;
use crate::names::NameMapping;
use crate::types::{BoxScoreRecord, ResolvedWager};

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &str, what: &str) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} from {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {what} from {path}"))
}

/// Write via a sibling temp file so a crash never leaves half a file.
fn write_json<T: Serialize + ?Sized>(value: &T, path: &str, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialise {what}"))?;

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = format!("{path}.tmp");
    std::fs::write(&tmp, &json).with_context(|| format!("Failed to write {what} to {tmp}"))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to move {tmp} to {path}"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Load the wager batch handed over by odds processing.
///
/// Records stay as JSON values so one bad record is rejected at ingest
/// instead of failing the file; see [`Ingestor::ingest_json`].
///
/// [`Ingestor::ingest_json`]: crate::engine::ingest::Ingestor::ingest_json
pub fn load_wagers(path: &str) -> Result<Vec<Value>> {
    let records: Vec<Value> = read_json(path, "wager records")?;
    info!(path, records = records.len(), "Wager records loaded");
    Ok(records)
}

/// Load the box-score batch handed over by stats collection. Records that
/// don't decode are skipped with a warning.
pub fn load_box_scores(path: &str) -> Result<Vec<BoxScoreRecord>> {
    let values: Vec<Value> = read_json(path, "box scores")?;
    let total = values.len();
    let records: Vec<BoxScoreRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match BoxScoreRecord::deserialize(&value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path, record = index, error = %e, "Box score record skipped");
                None
            }
        })
        .collect();
    info!(path, records = records.len(), skipped = total - records.len(), "Box scores loaded");
    Ok(records)
}

// ---------------------------------------------------------------------------
// Name mappings
// ---------------------------------------------------------------------------

/// Returns an empty table if the file doesn't exist.
pub fn load_name_mappings(path: &str) -> Result<Vec<NameMapping>> {
    if !Path::new(path).exists() {
        info!(path, "No name mappings found, starting fresh");
        return Ok(Vec::new());
    }
    let mappings: Vec<NameMapping> = read_json(path, "name mappings")?;
    info!(path, mappings = mappings.len(), "Name mappings loaded");
    Ok(mappings)
}

pub fn save_name_mappings(mappings: &[NameMapping], path: &str) -> Result<()> {
    write_json(mappings, path, "name mappings")?;
    debug!(path, mappings = mappings.len(), "Name mappings saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Returns an empty ledger if the file doesn't exist.
pub fn load_ledger(path: &str) -> Result<Ledger> {
    if !Path::new(path).exists() {
        info!(path, "No resolved-wager ledger found, starting fresh");
        return Ok(Ledger::new());
    }
    let entries: Vec<ResolvedWager> = read_json(path, "resolved wagers")?;
    let ledger: Ledger = entries
        .into_iter()
        .map(|r| (r.wager.id.clone(), r))
        .collect();
    info!(path, entries = ledger.len(), "Resolved-wager ledger loaded");
    Ok(ledger)
}

/// Saved as a JSON array ordered by wager id.
pub fn save_ledger(ledger: &Ledger, path: &str) -> Result<()> {
    let entries: Vec<&ResolvedWager> = ledger.values().collect();
    write_json(&entries, path, "resolved wagers")?;
    debug!(path, entries = entries.len(), "Resolved-wager ledger saved");
    Ok(())
}

/// Delete a state file (for testing or reset).
pub fn delete_file(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path).with_context(|| format!("Failed to delete {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
