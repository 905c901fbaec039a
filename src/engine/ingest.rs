//! Ingest: scraped odds records into typed wagers.
//!
//! Upstream records arrive loosely typed: odds as `"+150"` or
//! `"1.5 (+150)"`, sides as `"Over"`/`"yes"`, dates with or without a year.
//! Each record either becomes a [`Wager`] or is reported back as a
//! [`FlaggedItem`]; one bad record never stops the batch.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::{FlagKind, FlaggedItem};
use crate::markets::{Comparison, MarketRegistry};
use crate::names::normalize_key;
use crate::strategy::ev::AmericanOdds;
use crate::strategy::Pricing;
use crate::types::{BetSide, EvTier, LineValue, MarketType, Wager, WagerError};

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// Odds as they appear in scraped JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOdds {
    American(i32),
    Decimal(f64),
    Text(String),
}

/// One wager record as handed over by odds processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWager {
    #[serde(default)]
    pub id: Option<String>,
    pub player: String,
    #[serde(default)]
    pub team: Option<String>,
    pub market: String,
    #[serde(default)]
    pub line: Option<Decimal>,
    #[serde(default)]
    pub side: Option<String>,
    pub odds: RawOdds,
    pub sportsbook: String,
    #[serde(default)]
    pub ev_tier: Option<String>,
    #[serde(default)]
    pub fair_probability: Option<Decimal>,
    pub observation_date: String,
}

// ---------------------------------------------------------------------------
// Ingest report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub accepted: Vec<Wager>,
    pub rejected: Vec<FlaggedItem>,
    /// Records whose id was already seen earlier in the batch.
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

pub struct Ingestor<'a> {
    pricing: &'a Pricing,
    markets: &'a MarketRegistry,
    /// Supplies the year for dates scraped without one ("Jun 29").
    reference_date: NaiveDate,
}

impl<'a> Ingestor<'a> {
    pub fn new(pricing: &'a Pricing, markets: &'a MarketRegistry, reference_date: NaiveDate) -> Self {
        Self {
            pricing,
            markets,
            reference_date,
        }
    }

    /// Convert a batch. Ids are unique in the output; later duplicates are
    /// dropped.
    pub fn ingest(&self, records: &[RawWager]) -> IngestReport {
        self.ingest_each(records.iter().map(Ok))
    }

    /// Decode and convert records as read from an input file. A record that
    /// doesn't decode is rejected on its own and the rest still go through.
    pub fn ingest_json(&self, records: &[serde_json::Value]) -> IngestReport {
        self.ingest_each(records.iter().enumerate().map(|(index, value)| {
            RawWager::deserialize(value).map_err(|e| undecodable(index, value, &e))
        }))
    }

    fn ingest_each<R: Borrow<RawWager>>(
        &self,
        records: impl Iterator<Item = Result<R, FlaggedItem>>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut total = 0;

        for (index, record) in records.enumerate() {
            total += 1;
            let raw = match record {
                Ok(raw) => raw,
                Err(flag) => {
                    warn!(record = index, error = %flag.reason, "Wager record rejected");
                    report.rejected.push(flag);
                    continue;
                }
            };
            let raw = raw.borrow();
            match self.parse(raw) {
                Ok(wager) => {
                    if !seen.insert(wager.id.clone()) {
                        debug!(wager = %wager.id, "Duplicate wager record dropped");
                        report.duplicates += 1;
                        continue;
                    }
                    report.accepted.push(wager);
                }
                Err(e) => {
                    warn!(
                        record = index,
                        player = %raw.player,
                        market = %raw.market,
                        error = %e,
                        "Wager record rejected"
                    );
                    report.rejected.push(FlaggedItem {
                        wager_id: raw.id.clone().unwrap_or_else(|| record_label(index)),
                        player: raw.player.clone(),
                        kind: FlagKind::Rejected,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            records = total,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            duplicates = report.duplicates,
            "Ingest complete"
        );

        report
    }

    /// Convert one record.
    pub fn parse(&self, raw: &RawWager) -> Result<Wager, WagerError> {
        let market: MarketType = raw.market.parse()?;
        let odds = parse_odds(&raw.odds)?;
        let observation_date = parse_date(&raw.observation_date, self.reference_date)?;
        let proposition = self.markets.rule(market)?.comparison == Comparison::Proposition;

        let side = match raw.side.as_deref() {
            Some(s) => s.parse::<BetSide>().map_err(|_| WagerError::MalformedLine {
                market: market.to_string(),
                detail: format!("unknown side {s:?}"),
            })?,
            None if proposition => BetSide::Over,
            None => {
                return Err(WagerError::MalformedLine {
                    market: market.to_string(),
                    detail: "missing side".into(),
                })
            }
        };

        let line = match (proposition, raw.line.or_else(|| line_from_odds(&raw.odds))) {
            (true, Some(v)) if v >= Decimal::ONE => {
                return Err(WagerError::MalformedLine {
                    market: market.to_string(),
                    detail: format!("proposition quoted at {v}"),
                })
            }
            (true, _) => LineValue::Proposition,
            (false, Some(v)) => LineValue::Threshold(v),
            (false, None) => {
                return Err(WagerError::MalformedLine {
                    market: market.to_string(),
                    detail: "missing line".into(),
                })
            }
        };

        let id = raw
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| derive_id(observation_date, &raw.player, market, side, line, &raw.sportsbook));

        let tagged = raw.ev_tier.as_deref().and_then(|t| t.parse::<EvTier>().ok());
        let tier = self.pricing.tier_for(&id, odds, raw.fair_probability, tagged)?;

        Ok(Wager {
            id,
            player: raw.player.trim().to_string(),
            team: raw.team.clone().filter(|t| !t.trim().is_empty()),
            market_type: market,
            line,
            side,
            payout_odds: odds,
            sportsbook: raw.sportsbook.trim().to_string(),
            expected_value_tier: tier,
            fair_probability: raw.fair_probability,
            observation_date,
        })
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

fn record_label(index: usize) -> String {
    format!("record#{index}")
}

/// Salvage what identifies a record that failed to decode.
fn undecodable(index: usize, value: &serde_json::Value, error: &serde_json::Error) -> FlaggedItem {
    let text = |field: &str| value.get(field).and_then(|v| v.as_str()).map(str::to_string);
    FlaggedItem {
        wager_id: text("id").unwrap_or_else(|| record_label(index)),
        player: text("player").unwrap_or_default(),
        kind: FlagKind::Rejected,
        reason: WagerError::MalformedRecord(error.to_string()).to_string(),
    }
}

fn parse_odds(raw: &RawOdds) -> Result<AmericanOdds, WagerError> {
    match raw {
        RawOdds::American(v) => AmericanOdds::new(*v),
        RawOdds::Decimal(v) => Decimal::from_f64(*v)
            .and_then(AmericanOdds::from_decimal_odds)
            .ok_or_else(|| WagerError::MalformedOddsString(v.to_string())),
        RawOdds::Text(s) => AmericanOdds::parse(s),
    }
}

/// `"1.5 (+150)"` carries the line in front of the price.
fn line_from_odds(raw: &RawOdds) -> Option<Decimal> {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();

    let RawOdds::Text(s) = raw else {
        return None;
    };
    let re = LINE_RE.get_or_init(|| Regex::new(r"^\s*[oOuU]?\s*(\d+(?:\.\d+)?)\s*\(").unwrap());
    re.captures(s).and_then(|caps| Decimal::from_str(&caps[1]).ok())
}

/// Accepts ISO dates, US slashed dates and month-day with or without year.
fn parse_date(raw: &str, reference: NaiveDate) -> Result<NaiveDate, WagerError> {
    let s = raw.trim();
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%b %d %Y", "%b %d, %Y", "%B %d %Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    // Yearless: borrow the reference year.
    let with_year = format!("{s} {}", reference.year());
    for format in ["%b %d %Y", "%B %d %Y", "%m/%d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            return Ok(date);
        }
    }
    Err(WagerError::MalformedDate(raw.to_string()))
}

/// Stable id for records that arrive without one.
fn derive_id(
    date: NaiveDate,
    player: &str,
    market: MarketType,
    side: BetSide,
    line: LineValue,
    sportsbook: &str,
) -> String {
    format!(
        "{date}:{}:{}:{}:{}:{}",
        normalize_key(player).replace(' ', "-"),
        market.label().to_lowercase().replace(' ', "-"),
        side.to_string().to_lowercase(),
        line,
        sportsbook.trim().to_lowercase(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
