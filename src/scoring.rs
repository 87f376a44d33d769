//! Score calculation
//!
//! This module aggregates normalized records per user and derives a
//! rank-based score across the whole population.
//!
//! Scores are relative: adding or removing a single user can change every
//! other user's score, so they must be recomputed from the full dataset.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::types::{NormalizedRecord, ScoreData, Star};

/// Per-user sums before a score is assigned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTotals {
    pub time_taken_ms_one: i64,
    pub time_taken_ms_two: i64,
    pub total_time_taken_ms: i64,
    pub stars: u32,
}

impl UserTotals {
    fn add(&mut self, record: &NormalizedRecord) {
        if let Some(ms) = record.time_taken_ms_one {
            self.time_taken_ms_one = self.time_taken_ms_one.saturating_add(ms);
            self.total_time_taken_ms = self.total_time_taken_ms.saturating_add(ms);
            self.stars += 1;
        }
        if let Some(ms) = record.time_taken_ms_two {
            self.time_taken_ms_two = self.time_taken_ms_two.saturating_add(ms);
            self.total_time_taken_ms = self.total_time_taken_ms.saturating_add(ms);
            self.stars += 1;
        }
    }
}

/// Ranking function turning per-user data into scores
///
/// Implementations must be deterministic and independent of record order,
/// and must break every tie so that the result is a total order.
pub trait ScoringPolicy {
    /// Short identifier used in logs and CLI flags
    fn name(&self) -> &'static str;

    /// Score every user present in `totals`
    fn score(
        &self,
        records: &[NormalizedRecord],
        totals: &BTreeMap<String, UserTotals>,
    ) -> BTreeMap<String, u64>;
}

/// Points per star, ranked within each day
///
/// For every `(year, day, star)`, users who earned the star are ordered by
/// their delta (username breaks ties). With `N` users in the dataset, the
/// fastest earns `N` points, the next `N - 1`, and so on.
///
/// The score is `points * N + rank`, where `rank` is the user's
/// [`TotalTimePolicy`] score in `1..=N`. Equal points are therefore split by
/// total time, and no two users share a score.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalScorePolicy;

impl ScoringPolicy for LocalScorePolicy {
    fn name(&self) -> &'static str {
        "local"
    }

    fn score(
        &self,
        records: &[NormalizedRecord],
        totals: &BTreeMap<String, UserTotals>,
    ) -> BTreeMap<String, u64> {
        let population = totals.len() as u64;
        let mut points: BTreeMap<&str, u64> =
            totals.keys().map(|user| (user.as_str(), 0)).collect();

        let mut finishers: BTreeMap<(i32, u32, Star), Vec<(i64, &str)>> = BTreeMap::new();
        for record in records {
            for star in [Star::One, Star::Two] {
                if let Some(ms) = record.time_taken(star) {
                    finishers
                        .entry((record.year, record.day, star))
                        .or_default()
                        .push((ms, record.username.as_str()));
                }
            }
        }

        for (_, mut list) in finishers {
            list.sort_unstable();
            for (position, (_, user)) in list.into_iter().enumerate() {
                if let Some(earned) = points.get_mut(user) {
                    *earned += population.saturating_sub(position as u64);
                }
            }
        }

        let ranks = TotalTimePolicy.score(records, totals);
        points
            .into_iter()
            .map(|(user, earned)| {
                let rank = ranks.get(user).copied().unwrap_or(0);
                let score = earned.saturating_mul(population).saturating_add(rank);
                (user.to_string(), score)
            })
            .collect()
    }
}

/// Single ranking over total time
///
/// Users are ordered by total time, then by stars earned (more first), then
/// by username. With `N` users the first earns `N`, the last earns 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalTimePolicy;

impl ScoringPolicy for TotalTimePolicy {
    fn name(&self) -> &'static str {
        "total-time"
    }

    fn score(
        &self,
        _records: &[NormalizedRecord],
        totals: &BTreeMap<String, UserTotals>,
    ) -> BTreeMap<String, u64> {
        let population = totals.len() as u64;
        let mut ranked: Vec<(&String, &UserTotals)> = totals.iter().collect();
        ranked.sort_by(|(a_user, a), (b_user, b)| {
            a.total_time_taken_ms
                .cmp(&b.total_time_taken_ms)
                .then(b.stars.cmp(&a.stars))
                .then(a_user.cmp(b_user))
        });

        ranked
            .into_iter()
            .enumerate()
            .map(|(position, (user, _))| (user.clone(), population - position as u64))
            .collect()
    }
}

/// Built-in scoring policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Local,
    TotalTime,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Local => "local",
            PolicyKind::TotalTime => "total-time",
        }
    }

    /// Instantiate the policy
    pub fn policy(&self) -> Box<dyn ScoringPolicy> {
        match self {
            PolicyKind::Local => Box::new(LocalScorePolicy),
            PolicyKind::TotalTime => Box::new(TotalTimePolicy),
        }
    }
}

/// Aggregates records and applies a scoring policy
pub struct ScoreCalculator {
    policy: Box<dyn ScoringPolicy>,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(Box::new(LocalScorePolicy))
    }
}

impl ScoreCalculator {
    /// Create a calculator with a specific policy
    pub fn new(policy: Box<dyn ScoringPolicy>) -> Self {
        Self { policy }
    }

    /// Create a calculator for a built-in policy
    pub fn with_kind(kind: PolicyKind) -> Self {
        Self::new(kind.policy())
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Compute one `ScoreData` per distinct username
    pub fn calculate(&self, records: &[NormalizedRecord]) -> BTreeMap<String, ScoreData> {
        let mut totals: BTreeMap<String, UserTotals> = BTreeMap::new();
        for record in records {
            totals
                .entry(record.username.clone())
                .or_default()
                .add(record);
        }

        let scores = self.policy.score(records, &totals);
        debug!(
            "Scored {} users from {} records with {} policy",
            totals.len(),
            records.len(),
            self.policy.name()
        );

        totals
            .into_iter()
            .map(|(user, totals)| {
                let score = scores.get(&user).copied().unwrap_or(0);
                let data = ScoreData {
                    time_taken_ms_one: totals.time_taken_ms_one,
                    time_taken_ms_two: totals.time_taken_ms_two,
                    total_time_taken_ms: totals.total_time_taken_ms,
                    stars: totals.stars,
                    score,
                };
                (user, data)
            })
            .collect()
    }
}

/// Compute scores with the default policy
pub fn calculate_scores(records: &[NormalizedRecord]) -> BTreeMap<String, ScoreData> {
    ScoreCalculator::default().calculate(records)
}
