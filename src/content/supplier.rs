use super::source::{ContentSource, MAX_SENTENCE_LEN};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// FIFO backlog of text units handed out one at a time.
#[derive(Debug, Clone)]
pub struct ContentSupplier {
    backlog: VecDeque<String>,
    current: Option<String>,
    delivered: usize,
    max_sentence_len: usize,
}

impl ContentSupplier {
    pub fn new() -> Self {
        Self::with_max_sentence_len(MAX_SENTENCE_LEN)
    }

    pub fn with_max_sentence_len(max_sentence_len: usize) -> Self {
        Self {
            backlog: VecDeque::new(),
            current: None,
            delivered: 0,
            max_sentence_len,
        }
    }

    /// Replace the backlog with `count` units drawn, with repetition, from `source`.
    pub fn load(&mut self, source: &ContentSource, count: usize) {
        let rng = &mut rand::thread_rng();
        self.load_with_rng(source, count, rng);
    }

    pub fn load_with_rng<R: Rng + ?Sized>(
        &mut self,
        source: &ContentSource,
        count: usize,
        rng: &mut R,
    ) {
        self.backlog.clear();
        self.current = None;
        self.delivered = 0;

        let candidates = source.candidates(self.max_sentence_len);
        if candidates.is_empty() {
            return;
        }

        self.backlog.extend(
            (0..count).filter_map(|_| candidates.choose(&mut *rng).map(|unit| unit.to_string())),
        );

        debug!(
            "content loaded: {} units ({})",
            self.backlog.len(),
            source.difficulty
        );
    }

    /// Replace the backlog with exactly `items`, in order.
    pub fn load_custom<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backlog.clear();
        self.current = None;
        self.delivered = 0;
        self.backlog.extend(items.into_iter().map(Into::into));

        debug!("custom content loaded: {} units", self.backlog.len());
    }

    pub fn next(&mut self) -> Option<String> {
        self.current = self.backlog.pop_front();
        if self.current.is_some() {
            self.delivered += 1;
        }
        self.current.clone()
    }

    pub fn peek(&self) -> Option<&str> {
        self.backlog.front().map(String::as_str)
    }

    /// The unit most recently handed out by [`ContentSupplier::next`].
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn has_more(&self) -> bool {
        !self.backlog.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.backlog.len()
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn reset(&mut self) {
        self.backlog.clear();
        self.current = None;
        self.delivered = 0;
    }

    /// Exact match against the current unit.
    pub fn validate(&self, typed: &str) -> bool {
        self.current.as_deref() == Some(typed)
    }

    pub fn validate_ignore_case(&self, typed: &str) -> bool {
        self.current
            .as_deref()
            .is_some_and(|unit| unit.to_lowercase() == typed.to_lowercase())
    }

    /// Percentage of positions where `typed` matches the current unit,
    /// measured over the longer of the two.
    pub fn unit_accuracy(&self, typed: &str) -> f64 {
        let Some(unit) = self.current.as_deref() else {
            return 0.0;
        };

        let longest = unit.chars().count().max(typed.chars().count());
        if longest == 0 {
            return 0.0;
        }

        let matching = unit
            .chars()
            .zip(typed.chars())
            .filter(|(expected, actual)| expected == actual)
            .count();

        (matching as f64 * 100.0) / longest as f64
    }

    pub fn stats(&self) -> String {
        format!(
            "Units delivered: {}, Remaining: {}",
            self.delivered,
            self.backlog.len()
        )
    }
}

impl Default for ContentSupplier {
    fn default() -> Self {
        Self::new()
    }
}
