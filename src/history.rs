use crate::record::SessionRecord;
use crate::util::{mean, std_dev};
use std::collections::HashMap;

/// Every finished session, grouped by user.
#[derive(Debug, Default, Clone)]
pub struct SessionHistory {
    by_user: HashMap<String, Vec<SessionRecord>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: SessionRecord) {
        self.by_user
            .entry(record.user_id().to_string())
            .or_default()
            .push(record);
    }

    /// The user's sessions, oldest first.
    pub fn sessions(&self, user_id: &str) -> &[SessionRecord] {
        self.by_user.get(user_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn total_games(&self, user_id: &str) -> usize {
        self.sessions(user_id).len()
    }

    pub fn average_wpm(&self, user_id: &str) -> f64 {
        mean(&self.wpms(user_id)).unwrap_or(0.0)
    }

    pub fn average_accuracy(&self, user_id: &str) -> f64 {
        let accuracies = self
            .sessions(user_id)
            .iter()
            .map(SessionRecord::accuracy)
            .collect::<Vec<_>>();
        mean(&accuracies).unwrap_or(0.0)
    }

    pub fn best_wpm(&self, user_id: &str) -> f64 {
        self.sessions(user_id)
            .iter()
            .map(SessionRecord::wpm)
            .fold(0.0, f64::max)
    }

    /// Spread of the user's wpm across sessions; `None` with no sessions.
    pub fn wpm_std_dev(&self, user_id: &str) -> Option<f64> {
        std_dev(&self.wpms(user_id))
    }

    pub fn clear(&mut self, user_id: &str) -> usize {
        self.by_user
            .remove(user_id)
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }

    fn wpms(&self, user_id: &str) -> Vec<f64> {
        self.sessions(user_id)
            .iter()
            .map(SessionRecord::wpm)
            .collect()
    }
}
