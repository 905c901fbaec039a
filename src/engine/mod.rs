//! Core engine: ingest → resolve → account.

pub mod ingest;
pub mod resolver;
pub mod accountant;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a record was set aside for a human to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Raw record could not become a wager.
    Rejected,
    /// Player name matched nothing.
    UnmatchedName,
    /// Still unresolved after this run (no box score, game not final).
    Unresolved,
    /// Resolved, but below the review threshold.
    LowConfidence,
    /// Wager can never resolve as stated (bad line for its market).
    Failed,
    /// Correction run changed a previously terminal result.
    Corrected,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlagKind::Rejected => "rejected",
            FlagKind::UnmatchedName => "unmatched name",
            FlagKind::Unresolved => "unresolved",
            FlagKind::LowConfidence => "low confidence",
            FlagKind::Failed => "failed",
            FlagKind::Corrected => "corrected",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedItem {
    /// Wager id, or the raw record's position when it never got one.
    pub wager_id: String,
    pub player: String,
    pub kind: FlagKind,
    pub reason: String,
}

impl fmt::Display for FlaggedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.kind, self.wager_id, self.player, self.reason)
    }
}
