//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section is optional; anything left out falls back to the built-in
//! defaults. The loaded config is validated before use.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::engine::accountant::DateRange;
use crate::engine::resolver::{ResolutionConfig, ResolutionMode};
use crate::markets::MarketRule;
use crate::names::NameConfig;
use crate::strategy::ev::EvTierConfig;
use crate::strategy::staking::StakeSchedule;
use crate::types::MarketType;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub run: RunConfig,
    pub names: NameConfig,
    pub resolution: ResolutionConfig,
    pub ev_tiers: EvTierConfig,
    pub staking: StakeSchedule,
    /// Per-market replacements for the built-in settlement rules.
    pub market_rules: HashMap<MarketType, MarketRule>,
}

/// File locations and per-run switches. Dates are quoted `"YYYY-MM-DD"`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub wagers_path: String,
    pub box_scores_path: String,
    pub name_mappings_path: String,
    pub ledger_path: String,
    /// Re-resolve wagers that already have a terminal result.
    pub correction_mode: bool,
    pub report_start: Option<NaiveDate>,
    pub report_end: Option<NaiveDate>,
    /// Year source for dates scraped without one. Defaults to today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wagers_path: "data/wagers.json".into(),
            box_scores_path: "data/box_scores.json".into(),
            name_mappings_path: "data/name_mappings.json".into(),
            ledger_path: "data/resolved_wagers.json".into(),
            correction_mode: false,
            report_start: None,
            report_end: None,
            reference_date: None,
        }
    }
}

/// A config that parses but cannot be run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("EV tier thresholds must strictly increase (b < c < d < e)")]
    UnorderedTiers,

    #[error("Invalid stake schedule: {0}")]
    StakeSchedule(String),

    #[error("Fuzzy threshold {0} outside (0, 1]")]
    FuzzyThreshold(f64),

    #[error("{name} = {value} outside [0, 1]")]
    Confidence { name: &'static str, value: f64 },

    #[error("Report range starts after it ends ({start} > {end})")]
    ReportRange { start: NaiveDate, end: NaiveDate },
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {path}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ev_tiers.is_ordered() {
            return Err(ConfigError::UnorderedTiers);
        }
        self.staking.validate().map_err(ConfigError::StakeSchedule)?;

        let threshold = self.names.fuzzy_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::FuzzyThreshold(threshold));
        }

        let r = &self.resolution;
        for (name, value) in [
            ("exact_final_confidence", r.exact_final_confidence),
            ("fuzzy_penalty", r.fuzzy_penalty),
            ("ambiguous_status_penalty", r.ambiguous_status_penalty),
            ("review_threshold", r.review_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Confidence { name, value });
            }
        }

        if let (Some(start), Some(end)) = (self.run.report_start, self.run.report_end) {
            if start > end {
                return Err(ConfigError::ReportRange { start, end });
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> ResolutionMode {
        if self.run.correction_mode {
            ResolutionMode::Correction
        } else {
            ResolutionMode::Normal
        }
    }

    pub fn report_range(&self) -> DateRange {
        DateRange::new(self.run.report_start, self.run.report_end)
    }
}
