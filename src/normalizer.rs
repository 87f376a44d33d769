//! Record normalization
//!
//! This module turns raw completion records into typed records with parsed
//! timestamps and start-to-star deltas.
//! - Records without a start or a first star are dropped
//! - A missing second star leaves its delta unset rather than zero
//! - Records with a star earlier than their start are dropped
//! - Duplicate user/day records collapse to the best one

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::ComputeError;
use crate::schema::RawRecord;
use crate::types::NormalizedRecord;

/// Normalizer for converting raw records to normalized records
pub struct Normalizer;

impl Normalizer {
    /// Normalize a batch of raw records
    ///
    /// The output is ordered by username, year and day. Callers should not
    /// rely on it matching the input order.
    pub fn normalize(raw: &[RawRecord]) -> Result<Vec<NormalizedRecord>, ComputeError> {
        let mut by_user_day: BTreeMap<(String, i32, u32), NormalizedRecord> = BTreeMap::new();
        let mut skipped = 0usize;

        for record in raw {
            // We only care about records that can produce a score
            let (Some(start), Some(one)) = (&record.start_time, &record.star_one) else {
                skipped += 1;
                continue;
            };

            let start_time = start.to_utc("startTime")?;
            let star_one = one.to_utc("starOne")?;
            let star_two = record
                .star_two
                .as_ref()
                .map(|ts| ts.to_utc("starTwo"))
                .transpose()?;

            let time_taken_ms_one = time_taken(start_time, Some(star_one));
            let time_taken_ms_two = time_taken(start_time, star_two);
            if [time_taken_ms_one, time_taken_ms_two]
                .iter()
                .flatten()
                .any(|ms| *ms < 0)
            {
                warn!(
                    "Dropping record for {} ({} day {}): star earned before start",
                    record.username, record.year, record.day
                );
                continue;
            }

            let normalized = NormalizedRecord {
                day: record.day,
                year: record.year,
                username: record.username.clone(),
                start_time,
                star_one,
                star_two,
                time_taken_ms_one,
                time_taken_ms_two,
            };

            let key = (record.username.clone(), record.year, record.day);
            match by_user_day.get(&key) {
                Some(existing) if rank_key(existing) <= rank_key(&normalized) => {
                    warn!(
                        "Dropping duplicate record for {} ({} day {})",
                        record.username, record.year, record.day
                    );
                }
                Some(_) => {
                    warn!(
                        "Replacing duplicate record for {} ({} day {})",
                        record.username, record.year, record.day
                    );
                    by_user_day.insert(key, normalized);
                }
                None => {
                    by_user_day.insert(key, normalized);
                }
            }
        }

        if skipped > 0 {
            debug!("Skipped {} records without a start or first star", skipped);
        }

        Ok(by_user_day.into_values().collect())
    }
}

/// Milliseconds from `start` to `star`, or `None` when the star is absent
fn time_taken(start: DateTime<Utc>, star: Option<DateTime<Utc>>) -> Option<i64> {
    star.map(|star| (star - start).num_milliseconds())
}

/// Ordering used to pick between duplicates; smaller wins
fn rank_key(record: &NormalizedRecord) -> (Reverse<u32>, Option<i64>, i64, DateTime<Utc>) {
    (
        Reverse(record.star_count()),
        record.time_taken_ms_one,
        record.time_taken_ms_two.unwrap_or(i64::MAX),
        record.start_time,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawTimestamp;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 1, 5, 0, 0).unwrap()
    }

    fn at(offset_ms: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::milliseconds(offset_ms)
    }

    #[test]
    fn test_computes_deltas_from_start() {
        let raw = vec![RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(at(1000))
            .with_star_two(at(2000))];

        let normalized = Normalizer::normalize(&raw).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].time_taken_ms_one, Some(1000));
        assert_eq!(normalized[0].time_taken_ms_two, Some(2000));
        assert_eq!(normalized[0].star_two, Some(at(2000)));
    }

    #[test]
    fn test_drops_records_without_start_or_star_one() {
        let raw = vec![
            RawRecord::new("ada", 2023, 1).with_star_one(at(1000)),
            RawRecord::new("bob", 2023, 1).started(t0()),
            RawRecord::new("cy", 2023, 1),
        ];

        assert!(Normalizer::normalize(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_missing_star_two_is_none_not_zero() {
        let raw = vec![RawRecord::new("ada", 2023, 2)
            .started(t0())
            .with_star_one(at(1500))];

        let normalized = Normalizer::normalize(&raw).unwrap();
        assert_eq!(normalized[0].time_taken_ms_one, Some(1500));
        assert_eq!(normalized[0].time_taken_ms_two, None);
        assert!(normalized[0].star_two.is_none());
    }

    #[test]
    fn test_zero_delta_is_kept_distinct_from_absent() {
        let raw = vec![RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(t0())];

        let normalized = Normalizer::normalize(&raw).unwrap();
        assert_eq!(normalized[0].time_taken_ms_one, Some(0));
        assert_eq!(normalized[0].time_taken_ms_two, None);
    }

    #[test]
    fn test_unparseable_timestamp_fails_the_pass() {
        let raw = vec![RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(RawTimestamp::Text("not a date".to_string()))];

        assert!(matches!(
            Normalizer::normalize(&raw),
            Err(ComputeError::DateParseError { field: "starOne", .. })
        ));
    }

    #[test]
    fn test_star_before_start_drops_only_that_record() {
        let raw = vec![
            RawRecord::new("ada", 2023, 1)
                .started(t0())
                .with_star_one(at(1000)),
            RawRecord::new("bob", 2023, 1)
                .started(at(5000))
                .with_star_one(at(1000)),
            RawRecord::new("cy", 2023, 1)
                .started(at(1000))
                .with_star_one(at(2000))
                .with_star_two(t0()),
        ];

        let normalized = Normalizer::normalize(&raw).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].username, "ada");
        assert_eq!(normalized[0].time_taken_ms_one, Some(1000));
    }

    #[test]
    fn test_duplicates_keep_best_record_in_any_order() {
        let slow = RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(at(9000));
        let fast = RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(at(3000));
        let two_stars = RawRecord::new("ada", 2023, 1)
            .started(t0())
            .with_star_one(at(8000))
            .with_star_two(at(12000));

        for raw in [
            vec![slow.clone(), fast.clone(), two_stars.clone()],
            vec![two_stars.clone(), fast.clone(), slow.clone()],
        ] {
            let normalized = Normalizer::normalize(&raw).unwrap();
            assert_eq!(normalized.len(), 1);
            assert_eq!(normalized[0].time_taken_ms_one, Some(8000));
            assert_eq!(normalized[0].time_taken_ms_two, Some(12000));
        }

        let normalized = Normalizer::normalize(&[slow, fast]).unwrap();
        assert_eq!(normalized[0].time_taken_ms_one, Some(3000));
    }
}
