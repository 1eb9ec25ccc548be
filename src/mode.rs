use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a session is bounded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// Type as much as possible before the clock runs out.
    Timed,
    /// No time limit; the session ends when the content runs out.
    FreePractice,
}

impl GameMode {
    /// Sentinel duration for modes without a time limit.
    pub const UNBOUNDED: i64 = -1;

    pub fn display_name(&self) -> &'static str {
        match self {
            GameMode::Timed => "Timed Mode",
            GameMode::FreePractice => "Free Practice",
        }
    }

    /// Default duration in seconds, or [`GameMode::UNBOUNDED`].
    pub fn default_duration(&self) -> i64 {
        match self {
            GameMode::Timed => 60,
            GameMode::FreePractice => Self::UNBOUNDED,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.default_duration() > 0
    }
}
