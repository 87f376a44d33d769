//! Presentation helpers for leaderboard tables
//!
//! Formatting and paging only; values arrive already computed by the
//! pipeline and are never altered here.

use serde::Serialize;

use crate::error::ComputeError;
use crate::types::{Row, StarData};

/// Page sizes offered to readers
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 100];

/// Default page size
pub const DEFAULT_PAGE_SIZE: usize = PAGE_SIZE_OPTIONS[0];

/// Glyph for a day with both stars
pub const GLYPH_BOTH: char = '★';
/// Glyph for a day with only the first star
pub const GLYPH_ONE: char = '☆';
/// Glyph for a day without stars
pub const GLYPH_NONE: char = '·';

/// Render a millisecond duration as `1h 02m 03s`, `4m 05s` or `12s`
pub fn format_duration_ms(ms: Option<i64>) -> String {
    let Some(ms) = ms else {
        return "-".to_string();
    };

    let total_secs = ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// One glyph per day, in the order given
pub fn format_stars(stars: &[StarData]) -> String {
    stars
        .iter()
        .map(|s| match (s.one, s.two) {
            (true, true) => GLYPH_BOTH,
            (true, false) | (false, true) => GLYPH_ONE,
            (false, false) => GLYPH_NONE,
        })
        .collect()
}

/// A page of the leaderboard, zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub index: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            index: 0,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(index: usize, per_page: usize) -> Result<Self, ComputeError> {
        if !PAGE_SIZE_OPTIONS.contains(&per_page) {
            return Err(ComputeError::InvalidPage(format!(
                "page size {} is not one of {:?}",
                per_page, PAGE_SIZE_OPTIONS
            )));
        }
        Ok(Self { index, per_page })
    }

    /// Page selected by optional index and size flags
    ///
    /// Returns `None` when neither is given. Setting only one of them uses
    /// the default for the other.
    pub fn requested(index: Option<usize>, per_page: Option<usize>) -> Result<Option<Self>, ComputeError> {
        if index.is_none() && per_page.is_none() {
            return Ok(None);
        }
        Self::new(index.unwrap_or(0), per_page.unwrap_or(DEFAULT_PAGE_SIZE)).map(Some)
    }

    /// Rows on this page; empty when past the end
    pub fn slice<'a>(&self, rows: &'a [Row]) -> &'a [Row] {
        let start = self.index.saturating_mul(self.per_page).min(rows.len());
        let end = start.saturating_add(self.per_page).min(rows.len());
        &rows[start..end]
    }

    /// Number of pages needed for `total` rows
    pub fn count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }

    /// Position of the first row on this page
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.per_page)
    }
}

/// Render rows as a plain-text table
pub fn render_table(rows: &[Row], first_rank: usize) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.user.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut out = format!(
        "{:>4}  {:<name_width$}  {:>6}  {:<25}  {}\n",
        "#", "Name", "Score", "Stars", "Total time"
    );

    for (i, row) in rows.iter().enumerate() {
        let score = row
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>4}  {:<name_width$}  {:>6}  {:<25}  {}\n",
            first_rank + i,
            row.user,
            score,
            format_stars(&row.stars),
            format_duration_ms(row.total_time)
        ));
    }

    out
}
