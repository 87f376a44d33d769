//! Starboard - scoring pipeline for daily two-star puzzle leaderboards
//!
//! Starboard turns raw per-user, per-day completion records into ranked
//! leaderboard rows through a deterministic pipeline: record normalization →
//! score calculation → row building.
//!
//! ## Modules
//!
//! - **Schema**: Raw record wire format, JSON/NDJSON decoding and validation
//! - **Pipeline**: Normalizer, score calculator and row builder
//! - **Format**: Duration and star formatters, pagination

pub mod error;
pub mod format;
pub mod normalizer;
pub mod pipeline;
pub mod rows;
pub mod schema;
pub mod scoring;
pub mod types;

pub use error::ComputeError;
pub use pipeline::{leaderboard_from_json, LeaderboardConfig, LeaderboardProcessor};
pub use rows::{build_rows, RowBuilder};
pub use scoring::{calculate_scores, PolicyKind, ScoreCalculator, ScoringPolicy};
pub use types::{NormalizedRecord, Row, ScoreData, StarData};

// Schema exports
pub use schema::{RawRecord, RawRecordAdapter, RawTimestamp};

/// Crate version reported by the CLI
pub const STARBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");
