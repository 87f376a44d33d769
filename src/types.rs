//! Core types for the starboard pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized records, per-user score aggregates, and leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of a day's two stars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Star {
    One,
    Two,
}

/// A raw record that survived normalization
///
/// Only exists for records with both a start and a first star, so
/// `time_taken_ms_one` is always set; it stays optional to keep the shape of
/// the two deltas symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub day: u32,
    pub year: i32,
    pub username: String,
    pub start_time: DateTime<Utc>,
    pub star_one: DateTime<Utc>,
    pub star_two: Option<DateTime<Utc>>,
    /// Milliseconds from start to the first star
    pub time_taken_ms_one: Option<i64>,
    /// Milliseconds from start to the second star
    pub time_taken_ms_two: Option<i64>,
}

impl NormalizedRecord {
    /// Delta for the given star, if earned
    pub fn time_taken(&self, star: Star) -> Option<i64> {
        match star {
            Star::One => self.time_taken_ms_one,
            Star::Two => self.time_taken_ms_two,
        }
    }

    /// Number of stars earned on this day
    pub fn star_count(&self) -> u32 {
        1 + u32::from(self.star_two.is_some())
    }

    /// Star flags for presentation
    pub fn star_data(&self) -> StarData {
        StarData {
            day: self.day,
            one: true,
            two: self.star_two.is_some(),
        }
    }
}

/// Per-user aggregate over every day the user has data for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreData {
    /// Sum of first-star deltas
    pub time_taken_ms_one: i64,
    /// Sum of second-star deltas (days without a second star excluded)
    pub time_taken_ms_two: i64,
    pub total_time_taken_ms: i64,
    /// Number of stars earned across all days
    pub stars: u32,
    /// Rank-derived score; only meaningful relative to the same dataset
    pub score: u64,
}

/// Star presence for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarData {
    pub day: u32,
    pub one: bool,
    pub two: bool,
}

/// One leaderboard row per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub user: String,
    /// Sorted ascending by day
    pub stars: Vec<StarData>,
    pub score: Option<u64>,
    /// Total milliseconds across all earned stars
    pub total_time: Option<i64>,
}
