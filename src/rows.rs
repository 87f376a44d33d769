//! Leaderboard row construction
//!
//! Joins the per-user star history with the score map. Both sides are built
//! once per pass and only read afterwards.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::schema::RawRecord;
use crate::scoring::ScoreCalculator;
use crate::types::{NormalizedRecord, Row, ScoreData, StarData};

/// Builds ordered leaderboard rows from raw records
#[derive(Default)]
pub struct RowBuilder {
    calculator: ScoreCalculator,
}

impl RowBuilder {
    pub fn new(calculator: ScoreCalculator) -> Self {
        Self { calculator }
    }

    /// Run normalization, scoring and the join in one pass
    pub fn build(&self, raw: &[RawRecord]) -> Result<Vec<Row>, ComputeError> {
        let normalized = Normalizer::normalize(raw)?;
        let scores = self.calculator.calculate(&normalized);
        let rows = join_rows(&normalized, &scores);

        info!(
            "Built {} rows from {} raw records ({} scoreable)",
            rows.len(),
            raw.len(),
            normalized.len()
        );

        Ok(rows)
    }
}

/// Build rows with the default scoring policy
pub fn build_rows(raw: &[RawRecord]) -> Result<Vec<Row>, ComputeError> {
    RowBuilder::default().build(raw)
}

/// Group stars per user and attach each user's score
///
/// A user missing from `scores` still gets a row, with no score or total.
pub fn join_rows(records: &[NormalizedRecord], scores: &BTreeMap<String, ScoreData>) -> Vec<Row> {
    let mut grouped: BTreeMap<&str, Vec<(u32, i32, StarData)>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.username.as_str())
            .or_default()
            .push((record.day, record.year, record.star_data()));
    }

    let mut rows: Vec<Row> = grouped
        .into_iter()
        .map(|(user, mut days)| {
            days.sort_by_key(|(day, year, _)| (*day, *year));
            let score = scores.get(user);
            if score.is_none() {
                warn!("No score computed for {}", user);
            }
            Row {
                user: user.to_string(),
                stars: days.into_iter().map(|(_, _, stars)| stars).collect(),
                score: score.map(|s| s.score),
                total_time: score.map(|s| s.total_time_taken_ms),
            }
        })
        .collect();

    rows.sort_by(compare_rows);
    rows
}

/// Display order: score descending, total time ascending, then name
fn compare_rows(a: &Row, b: &Row) -> Ordering {
    match (a.score, b.score) {
        (Some(sa), Some(sb)) => sb
            .cmp(&sa)
            .then(a.total_time.cmp(&b.total_time))
            .then_with(|| a.user.cmp(&b.user)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.user.cmp(&b.user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PolicyKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 1, 5, 0, 0).unwrap()
    }

    fn at(offset_ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(offset_ms)
    }

    fn solved(user: &str, day: u32, one: i64, two: Option<i64>) -> RawRecord {
        let record = RawRecord::new(user, 2023, day)
            .started(t0())
            .with_star_one(at(one));
        match two {
            Some(ms) => record.with_star_two(at(ms)),
            None => record,
        }
    }

    #[test]
    fn test_single_user_both_stars() {
        let rows = build_rows(&[solved("a", 1, 1000, Some(2000))]).unwrap();

        assert_eq!(
            rows,
            vec![Row {
                user: "a".to_string(),
                stars: vec![StarData {
                    day: 1,
                    one: true,
                    two: true
                }],
                score: Some(3),
                total_time: Some(3000),
            }]
        );
    }

    #[test]
    fn test_faster_user_ranks_first() {
        let rows = build_rows(&[solved("a", 1, 5000, None), solved("b", 1, 3000, None)]).unwrap();

        assert_eq!(rows[0].user, "b");
        assert_eq!(rows[1].user, "a");
        assert!(rows[0].score > rows[1].score);
    }

    #[test]
    fn test_star_one_only_day() {
        let rows = build_rows(&[
            solved("ada", 1, 1000, Some(1500)),
            solved("ada", 2, 4000, None),
        ])
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].stars[1],
            StarData {
                day: 2,
                one: true,
                two: false
            }
        );
        assert_eq!(rows[0].total_time, Some(1000 + 1500 + 4000));
    }

    #[test]
    fn test_incomplete_records_contribute_nothing() {
        let rows = build_rows(&[
            solved("ada", 1, 1000, None),
            RawRecord::new("ada", 2023, 2).started(t0()),
            RawRecord::new("ghost", 2023, 1).with_star_one(at(100)),
        ])
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user, "ada");
        assert_eq!(rows[0].stars.len(), 1);
    }

    #[test]
    fn test_stars_sorted_and_permutation_invariant() {
        let mut raw = vec![
            solved("ada", 3, 1000, None),
            solved("bob", 2, 2000, Some(2500)),
            solved("ada", 1, 3000, Some(3500)),
            solved("bob", 1, 1000, None),
            solved("ada", 2, 1500, Some(1600)),
        ];

        let first = build_rows(&raw).unwrap();
        raw.reverse();
        let second = build_rows(&raw).unwrap();
        raw.rotate_left(2);
        let third = build_rows(&raw).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);

        for row in &first {
            let days: Vec<u32> = row.stars.iter().map(|s| s.day).collect();
            let mut sorted = days.clone();
            sorted.sort();
            assert_eq!(days, sorted);
        }
    }

    #[test]
    fn test_orphan_user_keeps_row_without_score() {
        let normalized = Normalizer::normalize(&[
            solved("ada", 1, 1000, None),
            solved("bob", 1, 2000, None),
        ])
        .unwrap();
        let mut scores = ScoreCalculator::default().calculate(&normalized);
        scores.remove("bob");

        let rows = join_rows(&normalized, &scores);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].user, "bob");
        assert_eq!(rows[1].score, None);
        assert_eq!(rows[1].total_time, None);
        assert_eq!(rows[1].stars.len(), 1);
    }

    #[test]
    fn test_builder_with_policy() {
        let builder = RowBuilder::new(ScoreCalculator::with_kind(PolicyKind::TotalTime));
        let rows = builder
            .build(&[solved("a", 1, 5000, None), solved("b", 1, 3000, None)])
            .unwrap();
        assert_eq!(rows[0].user, "b");
        assert_eq!(rows[0].score, Some(2));
    }

    #[test]
    fn test_star_before_start_keeps_other_rows() {
        let rows = build_rows(&[
            solved("ada", 1, 1000, None),
            RawRecord::new("bob", 2023, 1)
                .started(at(5000))
                .with_star_one(at(1000)),
        ])
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user, "ada");
        assert_eq!(rows[0].total_time, Some(1000));
    }

    #[test]
    fn test_parse_failure_aborts_build() {
        let raw = vec![RawRecord::new("ada", 2023, 1)
            .started(crate::schema::RawTimestamp::Text("??".to_string()))
            .with_star_one(at(1000))];
        assert!(build_rows(&raw).is_err());
    }
}
