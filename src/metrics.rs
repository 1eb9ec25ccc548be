use crate::clock::{Clock, SystemClock};
use crate::mode::GameMode;
use crate::record::SessionRecord;
use crate::util::round1;
use log::{debug, info};
use std::fmt;
use std::time::{Duration, Instant};

/// Elapsed time never counts as less than this when deriving wpm.
pub const MIN_ELAPSED_MINUTES: f64 = 0.01;

/// Live accumulator for a single typing session.
///
/// Idle until [`MetricsRecorder::start`]; every recording call made while idle
/// is silently dropped. Wpm and accuracy are derived from the counters on each
/// read and never stored.
#[derive(Debug, Clone)]
pub struct MetricsRecorder<C: Clock = SystemClock> {
    clock: C,
    total_chars: usize,
    correct_chars: usize,
    error_count: usize,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    error_log: Vec<char>,
    active: bool,
}

impl MetricsRecorder<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MetricsRecorder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MetricsRecorder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            total_chars: 0,
            correct_chars: 0,
            error_count: 0,
            started_at: None,
            stopped_at: None,
            error_log: Vec::new(),
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.reset();
        self.started_at = Some(self.clock.now());
        self.active = true;
        info!("metrics recording started");
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.stopped_at = Some(self.clock.now());
        self.active = false;
        info!(
            "metrics recording stopped after {}s: {} chars, {} errors",
            self.elapsed_seconds(),
            self.total_chars,
            self.error_count
        );
    }

    pub fn reset(&mut self) {
        self.total_chars = 0;
        self.correct_chars = 0;
        self.error_count = 0;
        self.started_at = None;
        self.stopped_at = None;
        self.error_log.clear();
        self.active = false;
    }

    pub fn record_correct(&mut self, _c: char) {
        if !self.active {
            return;
        }
        self.total_chars += 1;
        self.correct_chars += 1;
    }

    pub fn record_error(&mut self, expected: char, typed: char) {
        if !self.active {
            return;
        }
        self.total_chars += 1;
        self.error_count += 1;
        self.error_log.push(expected);

        debug!(
            "error recorded: expected {expected:?}, typed {typed:?} (total errors: {})",
            self.error_count
        );
    }

    /// Take back the most recent mistake, returning the character that was expected.
    pub fn undo_last_error(&mut self) -> Option<char> {
        if !self.active {
            return None;
        }
        let undone = self.error_log.pop()?;
        self.error_count = self.error_count.saturating_sub(1);
        self.total_chars = self.total_chars.saturating_sub(1);

        debug!("error undone: {undone:?}");
        Some(undone)
    }

    pub fn peek_last_error(&self) -> Option<char> {
        self.error_log.last().copied()
    }

    pub fn error_log_len(&self) -> usize {
        self.error_log.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.error_log.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
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

    /// Time since start, frozen once stopped.
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let until = if self.active {
            self.clock.now()
        } else {
            self.stopped_at.unwrap_or(started_at)
        };
        until.saturating_duration_since(started_at)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    pub fn current_wpm(&self) -> f64 {
        let minutes = (self.elapsed().as_secs_f64() / 60.0).max(MIN_ELAPSED_MINUTES);
        let words = self.total_chars as f64 / 5.0;
        round1(words / minutes)
    }

    pub fn current_accuracy(&self) -> f64 {
        if self.total_chars == 0 {
            return 100.0;
        }
        round1((self.correct_chars as f64 * 100.0) / self.total_chars as f64)
    }

    /// Errors per minute over whole elapsed seconds.
    pub fn error_rate(&self) -> f64 {
        let minutes = self.elapsed_seconds() as f64 / 60.0;
        if minutes < MIN_ELAPSED_MINUTES {
            return 0.0;
        }
        round1(self.error_count as f64 / minutes)
    }

    /// Stop recording and freeze the counters into a [`SessionRecord`].
    pub fn finish(&mut self, user_id: &str, mode: GameMode) -> SessionRecord {
        self.stop();
        SessionRecord::new(
            user_id,
            mode,
            self.elapsed_seconds() as i64,
            self.total_chars,
            self.correct_chars,
            self.error_count,
        )
    }

    pub fn detailed_report(&self) -> String {
        [
            "=== Performance Report ===".to_string(),
            format!("WPM: {:.1}", self.current_wpm()),
            format!("Accuracy: {:.1}%", self.current_accuracy()),
            format!("Total Characters: {}", self.total_chars),
            format!("Correct Characters: {}", self.correct_chars),
            format!("Errors: {}", self.error_count),
            format!("Error Rate: {:.1} errors/min", self.error_rate()),
            format!("Time: {} seconds", self.elapsed_seconds()),
            format!("Errors in Log: {}", self.error_log.len()),
        ]
        .join("\n")
    }
}

impl<C: Clock> fmt::Display for MetricsRecorder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WPM: {:.1} | Accuracy: {:.1}% | Errors: {} | Time: {}s",
            self.current_wpm(),
            self.current_accuracy(),
            self.error_count,
            self.elapsed_seconds()
        )
    }
}
