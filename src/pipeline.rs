//! Pipeline orchestration
//!
//! This module provides the public API for starboard.
//! It orchestrates the full pipeline from raw record JSON to leaderboard rows.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::rows::RowBuilder;
use crate::schema::{RawRecord, RawRecordAdapter};
use crate::scoring::{PolicyKind, ScoreCalculator};
use crate::types::Row;

/// Leaderboard settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Scoring policy
    pub policy: PolicyKind,
    /// Only consider records from this event year
    pub year: Option<i32>,
}

impl LeaderboardConfig {
    /// Load settings from a JSON document; missing keys use defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Convert a raw JSON array of records to leaderboard rows.
///
/// # Arguments
/// * `raw_json` - JSON array of raw completion records
///
/// # Returns
/// Rows ordered for display, one per user with at least one star
///
/// # Example
/// ```ignore
/// let rows = leaderboard_from_json(&records_json)?;
/// ```
pub fn leaderboard_from_json(raw_json: &str) -> Result<Vec<Row>, ComputeError> {
    LeaderboardProcessor::default().process_json(raw_json)
}

/// Processor applying a fixed configuration to each batch.
///
/// Holds configuration only. Every call builds its own intermediate state, so
/// a refresh is simply another call with the full dataset.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardProcessor {
    config: LeaderboardConfig,
}

impl LeaderboardProcessor {
    /// Create a new processor with the given settings
    pub fn new(config: LeaderboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// Build rows from already decoded records
    pub fn process(&self, raw: &[RawRecord]) -> Result<Vec<Row>, ComputeError> {
        let builder = RowBuilder::new(ScoreCalculator::with_kind(self.config.policy));

        match self.config.year {
            Some(year) => {
                let filtered: Vec<RawRecord> =
                    raw.iter().filter(|r| r.year == year).cloned().collect();
                debug!(
                    "Kept {} of {} records for year {}",
                    filtered.len(),
                    raw.len(),
                    year
                );
                builder.build(&filtered)
            }
            None => builder.build(raw),
        }
    }

    /// Build rows from a JSON array of records
    pub fn process_json(&self, raw_json: &str) -> Result<Vec<Row>, ComputeError> {
        let records = RawRecordAdapter::parse_array(raw_json)?;
        self.process(&records)
    }

    /// Build rows from NDJSON records
    pub fn process_ndjson(&self, ndjson: &str) -> Result<Vec<Row>, ComputeError> {
        let records = RawRecordAdapter::parse_ndjson(ndjson)?;
        self.process(&records)
    }
}
