use crate::mode::GameMode;
use crate::record::SessionRecord;
use crate::util::wpm_bucket;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Leaderboard projection of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub user_id: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub mode: GameMode,
    pub created_at: DateTime<Local>,
    /// Position assigned by the read that produced this entry.
    pub rank: Option<usize>,
}

impl RankedEntry {
    pub fn new(
        user_id: impl Into<String>,
        wpm: f64,
        accuracy: f64,
        mode: GameMode,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            wpm,
            accuracy,
            mode,
            created_at,
            rank: None,
        }
    }

    /// Primary index key: wpm rounded to the nearest integer.
    pub fn bucket(&self) -> i64 {
        wpm_bucket(self.wpm)
    }

    pub fn composite_score(&self) -> f64 {
        (self.wpm * 0.7) + (self.accuracy * 0.3)
    }

    pub(crate) fn with_rank(&self, rank: usize) -> Self {
        Self {
            rank: Some(rank),
            ..self.clone()
        }
    }

    pub fn formatted_date(&self) -> String {
        self.created_at.format("%b %d, %Y %H:%M").to_string()
    }
}

impl From<&SessionRecord> for RankedEntry {
    fn from(record: &SessionRecord) -> Self {
        Self::new(
            record.user_id(),
            record.wpm(),
            record.accuracy(),
            record.mode(),
            record.created_at(),
        )
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} - {}: {:.1} WPM, {:.1}% accuracy ({})",
            self.rank.unwrap_or(0),
            self.user_id,
            self.wpm,
            self.accuracy,
            self.mode.display_name()
        )
    }
}

/// Full ranking order: wpm descending, then accuracy descending, then the
/// most recent entry first.
pub fn compare_entries(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    compare_desc(a.wpm, b.wpm)
        .then_with(|| compare_desc(a.accuracy, b.accuracy))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Two entries tie for ranking when their full ranking key matches,
/// regardless of who set them.
pub fn same_rank_key(a: &RankedEntry, b: &RankedEntry) -> bool {
    compare_entries(a, b) == Ordering::Equal
}

pub(crate) fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
