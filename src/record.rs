use crate::mode::GameMode;
use crate::util::round1;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Grade {
    #[strum(serialize = "A+")]
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Bands `0.6 * wpm + 0.4 * accuracy`; `A+` also needs 95% accuracy.
    pub fn from_metrics(wpm: f64, accuracy: f64) -> Self {
        let score = (wpm * 0.6) + (accuracy * 0.4);

        if score >= 90.0 && accuracy >= 95.0 {
            Grade::APlus
        } else if score >= 80.0 {
            Grade::A
        } else if score >= 70.0 {
            Grade::B
        } else if score >= 60.0 {
            Grade::C
        } else if score >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Frozen result of one completed session.
///
/// `wpm` and `accuracy` are derived once from the raw counters at construction,
/// so a record can always be rebuilt from its primitive fields. Deserializing
/// goes through the same path and ignores any stored `wpm` or `accuracy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSessionRecord")]
pub struct SessionRecord {
    user_id: String,
    mode: GameMode,
    duration_secs: i64,
    total_chars: usize,
    correct_chars: usize,
    error_count: usize,
    wpm: f64,
    accuracy: f64,
    created_at: DateTime<Local>,
}

/// The counter fields a record is rebuilt from.
#[derive(Deserialize)]
struct RawSessionRecord {
    user_id: String,
    mode: GameMode,
    duration_secs: i64,
    total_chars: usize,
    correct_chars: usize,
    error_count: usize,
    created_at: DateTime<Local>,
}

impl From<RawSessionRecord> for SessionRecord {
    fn from(raw: RawSessionRecord) -> Self {
        Self::with_timestamp(
            raw.user_id,
            raw.mode,
            raw.duration_secs,
            raw.total_chars,
            raw.correct_chars,
            raw.error_count,
            raw.created_at,
        )
    }
}

impl SessionRecord {
    pub fn new(
        user_id: impl Into<String>,
        mode: GameMode,
        duration_secs: i64,
        total_chars: usize,
        correct_chars: usize,
        error_count: usize,
    ) -> Self {
        Self::with_timestamp(
            user_id,
            mode,
            duration_secs,
            total_chars,
            correct_chars,
            error_count,
            Local::now(),
        )
    }

    pub fn with_timestamp(
        user_id: impl Into<String>,
        mode: GameMode,
        duration_secs: i64,
        total_chars: usize,
        correct_chars: usize,
        error_count: usize,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
            duration_secs,
            total_chars,
            correct_chars,
            error_count,
            wpm: calc_wpm(total_chars, duration_secs),
            accuracy: calc_accuracy(correct_chars, total_chars),
            created_at,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn wpm(&self) -> f64 {
        self.wpm
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn grade(&self) -> Grade {
        Grade::from_metrics(self.wpm, self.accuracy)
    }

    /// Errors per minute.
    pub fn error_rate(&self) -> f64 {
        if self.duration_secs <= 0 {
            return 0.0;
        }
        let minutes = self.duration_secs as f64 / 60.0;
        round1(self.error_count as f64 / minutes)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn formatted_date(&self) -> String {
        self.created_at.format("%b %d, %Y").to_string()
    }
}

impl fmt::Display for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {:.1} WPM, {:.1}% accuracy, {} errors, grade {} on {}",
            self.user_id,
            self.mode.display_name(),
            self.wpm,
            self.accuracy,
            self.error_count,
            self.grade(),
            self.formatted_date()
        )
    }
}

fn calc_wpm(total_chars: usize, duration_secs: i64) -> f64 {
    if duration_secs <= 0 {
        return 0.0;
    }
    let minutes = duration_secs as f64 / 60.0;
    let words = total_chars as f64 / 5.0;
    round1(words / minutes)
}

fn calc_accuracy(correct_chars: usize, total_chars: usize) -> f64 {
    if total_chars == 0 {
        return 0.0;
    }
    round1((correct_chars as f64 / total_chars as f64) * 100.0)
}
