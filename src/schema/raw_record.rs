//! Raw completion record schema
//!
//! One record per user per puzzle day, as supplied by the upstream data
//! source. Timestamps are optional: a user who has not opened a puzzle has no
//! `startTime`, and a user who has not finished part one has no `starOne`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ComputeError;

/// Last puzzle day of an event
pub const MAX_DAY: u32 = 25;

/// A timestamp as it appears on the wire
///
/// Upstream sources send either an RFC 3339 string or an integer number of
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Parse into an absolute UTC timestamp
    pub fn to_utc(&self, field: &'static str) -> Result<DateTime<Utc>, ComputeError> {
        match self {
            RawTimestamp::Millis(ms) => {
                DateTime::from_timestamp_millis(*ms).ok_or_else(|| ComputeError::DateParseError {
                    field,
                    message: format!("{} ms is out of range", ms),
                })
            }
            RawTimestamp::Text(text) => parse_timestamp_text(text).ok_or_else(|| {
                ComputeError::DateParseError {
                    field,
                    message: format!("unrecognised timestamp '{}'", text),
                }
            }),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Millis(value.timestamp_millis())
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A raw completion record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Puzzle day (1-25)
    pub day: u32,
    /// Event year
    pub year: i32,
    /// Display name of the participant
    pub username: String,
    /// When the participant opened the puzzle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<RawTimestamp>,
    /// When the first star was earned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_one: Option<RawTimestamp>,
    /// When the second star was earned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_two: Option<RawTimestamp>,
}

impl RawRecord {
    /// Create a record with no timestamps
    pub fn new(username: impl Into<String>, year: i32, day: u32) -> Self {
        Self {
            day,
            year,
            username: username.into(),
            start_time: None,
            star_one: None,
            star_two: None,
        }
    }

    /// Set the start timestamp
    pub fn started(mut self, at: impl Into<RawTimestamp>) -> Self {
        self.start_time = Some(at.into());
        self
    }

    /// Set the first star timestamp
    pub fn with_star_one(mut self, at: impl Into<RawTimestamp>) -> Self {
        self.star_one = Some(at.into());
        self
    }

    /// Set the second star timestamp
    pub fn with_star_two(mut self, at: impl Into<RawTimestamp>) -> Self {
        self.star_two = Some(at.into());
        self
    }

    /// Whether this record can contribute a completion time
    pub fn is_scoreable(&self) -> bool {
        self.start_time.is_some() && self.star_one.is_some()
    }

    /// Check the record against the upstream data contract
    ///
    /// Incomplete progress (no start, no stars) is valid; only data the
    /// source should never send is reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }

        if self.day == 0 || self.day > MAX_DAY {
            return Err(ValidationError::DayOutOfRange(self.day));
        }

        if self.star_two.is_some() && self.star_one.is_none() {
            return Err(ValidationError::StarTwoWithoutStarOne);
        }

        let parse = |field: &'static str, value: &Option<RawTimestamp>| {
            value
                .as_ref()
                .map(|ts| ts.to_utc(field))
                .transpose()
                .map_err(|e| ValidationError::BadTimestamp(e.to_string()))
        };
        let start = parse("startTime", &self.start_time)?;
        let one = parse("starOne", &self.star_one)?;
        let two = parse("starTwo", &self.star_two)?;

        if let Some(start) = start {
            for (field, star) in [("starOne", one), ("starTwo", two)] {
                if star.is_some_and(|star| star < start) {
                    return Err(ValidationError::StarBeforeStart(field));
                }
            }
        }

        Ok(())
    }
}

/// Record contract violations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username is empty")]
    EmptyUsername,

    #[error("Day {0} is outside 1..=25")]
    DayOutOfRange(u32),

    #[error("starTwo is set but starOne is missing")]
    StarTwoWithoutStarOne,

    #[error("{0}")]
    BadTimestamp(String),

    #[error("{0} is earlier than startTime")]
    StarBeforeStart(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_mixed_timestamps() {
        let json = r#"{
            "day": 3,
            "year": 2023,
            "username": "ada",
            "startTime": "2023-12-03T05:00:00.000Z",
            "starOne": 1701580012000,
            "starTwo": null
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.day, 3);
        assert_eq!(record.year, 2023);
        assert!(matches!(record.start_time, Some(RawTimestamp::Text(_))));
        assert_eq!(record.star_one, Some(RawTimestamp::Millis(1701580012000)));
        assert!(record.star_two.is_none());
        assert!(record.is_scoreable());
    }

    #[test]
    fn test_missing_keys_are_absent() {
        let record: RawRecord =
            serde_json::from_str(r#"{"day": 1, "year": 2023, "username": "bob"}"#).unwrap();
        assert!(record.start_time.is_none());
        assert!(!record.is_scoreable());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_parse_text_and_millis_agree() {
        let text = RawTimestamp::Text("2023-12-01T05:00:01.500Z".to_string());
        let millis = RawTimestamp::Millis(
            Utc.with_ymd_and_hms(2023, 12, 1, 5, 0, 1).unwrap().timestamp_millis() + 500,
        );
        assert_eq!(text.to_utc("startTime").unwrap(), millis.to_utc("startTime").unwrap());
    }

    #[test]
    fn test_offsetless_text_is_utc() {
        let ts = RawTimestamp::Text("2023-12-01T05:00:00".to_string());
        assert_eq!(
            ts.to_utc("startTime").unwrap(),
            Utc.with_ymd_and_hms(2023, 12, 1, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_timestamp() {
        let ts = RawTimestamp::Text("yesterday".to_string());
        let err = ts.to_utc("starOne").unwrap_err();
        assert!(matches!(err, ComputeError::DateParseError { field: "starOne", .. }));
    }

    #[test]
    fn test_validate_rejects_contract_violations() {
        assert_eq!(
            RawRecord::new("", 2023, 1).validate(),
            Err(ValidationError::EmptyUsername)
        );
        assert_eq!(
            RawRecord::new("ada", 2023, 26).validate(),
            Err(ValidationError::DayOutOfRange(26))
        );
        assert_eq!(
            RawRecord::new("ada", 2023, 1)
                .started(RawTimestamp::Millis(0))
                .with_star_two(RawTimestamp::Millis(10))
                .validate(),
            Err(ValidationError::StarTwoWithoutStarOne)
        );
        assert!(matches!(
            RawRecord::new("ada", 2023, 1)
                .started(RawTimestamp::Text("soon".to_string()))
                .validate(),
            Err(ValidationError::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_validate_flags_star_before_start() {
        assert_eq!(
            RawRecord::new("bob", 2023, 1)
                .started(RawTimestamp::Millis(5000))
                .with_star_one(RawTimestamp::Millis(1000))
                .validate(),
            Err(ValidationError::StarBeforeStart("starOne"))
        );
        assert_eq!(
            RawRecord::new("bob", 2023, 1)
                .started(RawTimestamp::Millis(1000))
                .with_star_one(RawTimestamp::Millis(2000))
                .with_star_two(RawTimestamp::Millis(500))
                .validate(),
            Err(ValidationError::StarBeforeStart("starTwo"))
        );
        // A star without a start cannot be out of order
        assert!(RawRecord::new("bob", 2023, 1)
            .with_star_one(RawTimestamp::Millis(1000))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_serialize_camel_case() {
        let record = RawRecord::new("ada", 2023, 1)
            .started(RawTimestamp::Millis(0))
            .with_star_one(RawTimestamp::Millis(1000));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["startTime"], 0);
        assert_eq!(value["starOne"], 1000);
        assert!(value.get("starTwo").is_none());
    }
}
