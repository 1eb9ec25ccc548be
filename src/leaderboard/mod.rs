pub mod entry;
pub mod export;

pub use entry::{compare_entries, same_rank_key, RankedEntry};

use crate::error::LeaderboardError;
use crate::mode::GameMode;
use crate::record::SessionRecord;
use crate::util::{mean, round1};
use entry::compare_desc;
use itertools::Itertools;
use log::{debug, info};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;
use std::sync::Arc;

/// Ranked, queryable store of finished sessions.
///
/// Every entry lives in three indexes at once:
/// - `by_bucket`: rounded wpm, highest bucket first
/// - `by_user`: each user's entries in insertion order
/// - `log`: every entry in insertion order
///
/// Within a bucket entries keep insertion order. Reads that rank entries
/// ([`Leaderboard::top_n`], [`Leaderboard::user_rank`]) order a bucket by
/// accuracy at read time. [`Leaderboard::top_n_by_mode`] instead sorts on exact
/// wpm, so two entries with equal buckets may rank differently between the two.
#[derive(Debug, Default, Clone)]
pub struct Leaderboard {
    by_bucket: BTreeMap<Reverse<i64>, Vec<Arc<RankedEntry>>>,
    by_user: HashMap<String, Vec<Arc<RankedEntry>>>,
    log: Vec<Arc<RankedEntry>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: RankedEntry) -> Result<(), LeaderboardError> {
        validate(&entry)?;

        let entry = Arc::new(RankedEntry { rank: None, ..entry });
        self.by_bucket
            .entry(Reverse(entry.bucket()))
            .or_default()
            .push(Arc::clone(&entry));
        self.by_user
            .entry(entry.user_id.clone())
            .or_default()
            .push(Arc::clone(&entry));
        self.log.push(Arc::clone(&entry));

        info!("score added: {} - {:.1} WPM", entry.user_id, entry.wpm);
        Ok(())
    }

    pub fn add_session(&mut self, record: &SessionRecord) -> Result<(), LeaderboardError> {
        self.add(RankedEntry::from(record))
    }

    /// Every entry in ranking-walk order: highest bucket first, each bucket
    /// ordered by accuracy (stable, so ties keep insertion order).
    fn ranking_walk(&self) -> impl Iterator<Item = &RankedEntry> + '_ {
        self.by_bucket.values().flat_map(|bucket| {
            bucket
                .iter()
                .map(Deref::deref)
                .sorted_by(|a, b| compare_desc(a.accuracy, b.accuracy))
        })
    }

    pub fn top_n(&self, n: usize) -> Vec<RankedEntry> {
        self.ranking_walk()
            .take(n)
            .enumerate()
            .map(|(i, entry)| entry.with_rank(i + 1))
            .collect()
    }

    /// The user's highest-wpm entry; the earliest one wins a tie.
    pub fn user_best(&self, user_id: &str) -> Option<RankedEntry> {
        self.by_user
            .get(user_id)?
            .iter()
            .map(Deref::deref)
            .reduce(|best, entry| if entry.wpm > best.wpm { entry } else { best })
            .cloned()
    }

    /// 1-based position of the user's best entry in the [`Leaderboard::top_n`]
    /// order, or `None` when the user has no entries.
    pub fn user_rank(&self, user_id: &str) -> Option<usize> {
        let best = self.user_best(user_id)?;

        self.ranking_walk()
            .position(|entry| entry.user_id == user_id && entry.wpm == best.wpm)
            .map(|pos| pos + 1)
    }

    /// The user's entries, most recent first.
    pub fn user_scores(&self, user_id: &str) -> Vec<RankedEntry> {
        self.by_user
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (**entry).clone())
                    .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Best entries for one mode, compared on exact wpm then accuracy.
    pub fn top_n_by_mode(&self, mode: GameMode, n: usize) -> Vec<RankedEntry> {
        self.log
            .iter()
            .map(Deref::deref)
            .filter(|entry| entry.mode == mode)
            .sorted_by(|a, b| {
                compare_desc(a.wpm, b.wpm).then_with(|| compare_desc(a.accuracy, b.accuracy))
            })
            .take(n)
            .enumerate()
            .map(|(i, entry)| entry.with_rank(i + 1))
            .collect()
    }

    /// Every entry, in full ranking-key order (see [`compare_entries`]).
    pub fn standings(&self) -> Vec<RankedEntry> {
        self.log
            .iter()
            .map(Deref::deref)
            .sorted_by(|a, b| compare_entries(a, b))
            .enumerate()
            .map(|(i, entry)| entry.with_rank(i + 1))
            .collect()
    }

    /// Entries whose bucket lies in `[min_wpm, max_wpm]`, highest bucket first.
    pub fn scores_in_range(&self, min_wpm: i64, max_wpm: i64) -> Vec<RankedEntry> {
        if min_wpm > max_wpm {
            return Vec::new();
        }

        self.by_bucket
            .range(Reverse(max_wpm)..=Reverse(min_wpm))
            .flat_map(|(_, bucket)| bucket.iter().map(|entry| (**entry).clone()))
            .collect()
    }

    /// Entries in the order they were added.
    pub fn chronological(&self) -> impl Iterator<Item = &RankedEntry> + '_ {
        self.log.iter().map(Deref::deref)
    }

    pub fn clear_all(&mut self) {
        self.by_bucket.clear();
        self.by_user.clear();
        self.log.clear();
        info!("all scores cleared");
    }

    /// Remove every entry belonging to `user_id`, returning how many were removed.
    pub fn clear_user(&mut self, user_id: &str) -> usize {
        let Some(removed) = self.by_user.remove(user_id) else {
            return 0;
        };

        let buckets = removed
            .iter()
            .map(|entry| entry.bucket())
            .unique()
            .collect::<Vec<_>>();

        for bucket in buckets {
            let key = Reverse(bucket);
            if let Some(entries) = self.by_bucket.get_mut(&key) {
                entries.retain(|entry| entry.user_id != user_id);
                if entries.is_empty() {
                    self.by_bucket.remove(&key);
                    debug!("bucket {bucket} emptied");
                }
            }
        }

        self.log.retain(|entry| entry.user_id != user_id);

        info!("cleared {} scores for {}", removed.len(), user_id);
        removed.len()
    }

    pub fn highest_wpm(&self) -> f64 {
        self.by_bucket
            .values()
            .next()
            .and_then(|bucket| {
                bucket
                    .iter()
                    .map(|entry| entry.wpm)
                    .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            })
            .unwrap_or(0.0)
    }

    pub fn average_wpm(&self) -> f64 {
        let wpms = self.log.iter().map(|entry| entry.wpm).collect::<Vec<_>>();
        mean(&wpms).map(round1).unwrap_or(0.0)
    }

    pub fn total_count(&self) -> usize {
        self.log.len()
    }

    pub fn unique_user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn statistics(&self) -> String {
        format!(
            "Total Scores: {} | Unique Players: {} | Highest WPM: {:.1} | Average WPM: {:.1}",
            self.total_count(),
            self.unique_user_count(),
            self.highest_wpm(),
            self.average_wpm()
        )
    }
}

fn validate(entry: &RankedEntry) -> Result<(), LeaderboardError> {
    if entry.user_id.trim().is_empty() {
        return Err(LeaderboardError::invalid("user id is empty"));
    }
    if !entry.wpm.is_finite() || entry.wpm < 0.0 {
        return Err(LeaderboardError::invalid(format!(
            "wpm must be a non-negative number, got {}",
            entry.wpm
        )));
    }
    if !(0.0..=100.0).contains(&entry.accuracy) {
        return Err(LeaderboardError::invalid(format!(
            "accuracy must be within 0..=100, got {}",
            entry.accuracy
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Local, TimeZone};

    fn at(minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn entry(user: &str, wpm: f64, accuracy: f64, minute: u32) -> RankedEntry {
        RankedEntry::new(user, wpm, accuracy, GameMode::Timed, at(minute))
    }

    fn practice(user: &str, wpm: f64, accuracy: f64, minute: u32) -> RankedEntry {
        RankedEntry::new(user, wpm, accuracy, GameMode::FreePractice, at(minute))
    }

    fn board(entries: Vec<RankedEntry>) -> Leaderboard {
        let mut board = Leaderboard::new();
        for e in entries {
            board.add(e).unwrap();
        }
        board
    }

    fn wpms(entries: &[RankedEntry]) -> Vec<f64> {
        entries.iter().map(|e| e.wpm).collect()
    }

    fn users(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.user_id.as_str()).collect()
    }

    /// Each entry appears exactly once per index and no bucket is empty.
    fn assert_indexes_consistent(board: &Leaderboard) {
        let bucketed: usize = board.by_bucket.values().map(Vec::len).sum();
        let per_user: usize = board.by_user.values().map(Vec::len).sum();
        assert_eq!(bucketed, board.log.len());
        assert_eq!(per_user, board.log.len());
        assert!(board.by_bucket.values().all(|b| !b.is_empty()));
        assert!(board.by_user.values().all(|u| !u.is_empty()));

        for logged in &board.log {
            let in_bucket = board.by_bucket[&Reverse(logged.bucket())]
                .iter()
                .filter(|e| Arc::ptr_eq(e, logged))
                .count();
            let in_user = board.by_user[&logged.user_id]
                .iter()
                .filter(|e| Arc::ptr_eq(e, logged))
                .count();
            assert_eq!(in_bucket, 1);
            assert_eq!(in_user, 1);
        }
    }

    #[test]
    fn test_top_n_orders_by_wpm() {
        let board = board(vec![
            entry("a", 30.0, 90.0, 0),
            entry("b", 50.0, 90.0, 1),
            entry("c", 40.0, 90.0, 2),
        ]);

        let top = board.top_n(3);

        assert_eq!(wpms(&top), vec![50.0, 40.0, 30.0]);
        assert_eq!(
            top.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_top_n_sorts_bucket_by_accuracy_at_read_time() {
        // 50.4 and 49.6 share bucket 50; the more accurate one leads even
        // though its exact wpm is lower.
        let board = board(vec![
            entry("fast", 50.4, 85.0, 0),
            entry("steady", 49.6, 99.0, 1),
            entry("slow", 30.0, 100.0, 2),
        ]);

        assert_eq!(users(&board.top_n(3)), vec!["steady", "fast", "slow"]);
    }

    #[test]
    fn test_top_n_and_top_n_by_mode_disagree_within_a_bucket() {
        let board = board(vec![
            entry("fast", 50.4, 85.0, 0),
            entry("steady", 49.6, 99.0, 1),
        ]);

        assert_eq!(users(&board.top_n(2)), vec!["steady", "fast"]);
        assert_eq!(
            users(&board.top_n_by_mode(GameMode::Timed, 2)),
            vec!["fast", "steady"]
        );
    }

    #[test]
    fn test_top_n_equal_accuracy_keeps_insertion_order() {
        let board = board(vec![
            entry("first", 40.0, 90.0, 0),
            entry("second", 40.2, 90.0, 1),
            entry("third", 39.8, 90.0, 2),
        ]);

        assert_eq!(users(&board.top_n(3)), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_n_respects_limit_and_is_idempotent() {
        let board = board(vec![
            entry("a", 10.0, 90.0, 0),
            entry("b", 20.0, 91.0, 1),
            entry("c", 20.0, 92.0, 2),
            entry("d", 70.0, 50.0, 3),
        ]);

        assert_eq!(board.top_n(2).len(), 2);
        assert_eq!(board.top_n(10).len(), 4);
        assert!(board.top_n(0).is_empty());
        assert_eq!(board.top_n(4), board.top_n(4));
    }

    #[test]
    fn test_top_n_ordering_property() {
        let board = board(vec![
            entry("a", 12.3, 91.0, 0),
            entry("b", 12.4, 97.5, 1),
            entry("c", 88.8, 60.0, 2),
            entry("d", 11.6, 99.0, 3),
            entry("e", 45.0, 70.0, 4),
            entry("f", 44.5, 80.0, 5),
            entry("g", 12.0, 91.0, 6),
        ]);

        let top = board.top_n(board.total_count());
        for pair in top.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.bucket() > b.bucket() || (a.bucket() == b.bucket() && a.accuracy >= b.accuracy),
                "{a} ranked ahead of {b}"
            );
        }
    }

    #[test]
    fn test_empty_board() {
        let board = Leaderboard::new();

        assert!(board.is_empty());
        assert!(board.top_n(5).is_empty());
        assert_eq!(board.user_best("nobody"), None);
        assert_eq!(board.user_rank("nobody"), None);
        assert_eq!(board.highest_wpm(), 0.0);
        assert_eq!(board.average_wpm(), 0.0);
        assert_eq!(board.total_count(), 0);
        assert_eq!(board.unique_user_count(), 0);
    }

    #[test]
    fn test_invalid_entries_are_rejected_without_changes() {
        let mut board = board(vec![entry("a", 40.0, 90.0, 0)]);

        assert_matches!(
            board.add(entry("  ", 40.0, 90.0, 1)),
            Err(LeaderboardError::InvalidEntry { .. })
        );
        assert_matches!(
            board.add(entry("b", f64::NAN, 90.0, 1)),
            Err(LeaderboardError::InvalidEntry { .. })
        );
        assert_matches!(
            board.add(entry("b", -1.0, 90.0, 1)),
            Err(LeaderboardError::InvalidEntry { .. })
        );
        assert_matches!(
            board.add(entry("b", f64::INFINITY, 90.0, 1)),
            Err(LeaderboardError::InvalidEntry { .. })
        );
        assert_matches!(
            board.add(entry("b", 40.0, 100.5, 1)),
            Err(LeaderboardError::InvalidEntry { .. })
        );

        assert_eq!(board.total_count(), 1);
        assert_eq!(board.unique_user_count(), 1);
        assert_indexes_consistent(&board);
    }

    #[test]
    fn test_incoming_rank_is_discarded() {
        let mut board = Leaderboard::new();
        board.add(entry("a", 40.0, 90.0, 0).with_rank(9)).unwrap();

        assert_eq!(board.chronological().next().unwrap().rank, None);
        assert_eq!(board.top_n(1)[0].rank, Some(1));
    }

    #[test]
    fn test_add_session_converts_record() {
        let mut board = Leaderboard::new();
        let record = SessionRecord::new("gus", GameMode::Timed, 60, 500, 450, 50);

        board.add_session(&record).unwrap();

        let best = board.user_best("gus").unwrap();
        assert_eq!(best.wpm, 100.0);
        assert_eq!(best.accuracy, 90.0);
        assert_eq!(best.created_at, record.created_at());
    }

    #[test]
    fn test_user_best_prefers_highest_wpm() {
        let board = board(vec![
            entry("a", 30.0, 99.0, 0),
            entry("a", 55.0, 80.0, 1),
            entry("a", 42.0, 95.0, 2),
            entry("b", 90.0, 95.0, 3),
        ]);

        let best = board.user_best("a").unwrap();
        assert_eq!(best.wpm, 55.0);
        assert_eq!(best.created_at, at(1));
    }

    #[test]
    fn test_user_best_tie_keeps_earliest() {
        let board = board(vec![entry("a", 55.0, 80.0, 1), entry("a", 55.0, 99.0, 2)]);

        assert_eq!(board.user_best("a").unwrap().created_at, at(1));
    }

    #[test]
    fn test_user_rank() {
        let board = board(vec![
            entry("a", 30.0, 90.0, 0),
            entry("b", 60.0, 90.0, 1),
            entry("c", 45.0, 90.0, 2),
            entry("a", 50.0, 90.0, 3),
        ]);

        assert_eq!(board.user_rank("b"), Some(1));
        assert_eq!(board.user_rank("a"), Some(2));
        assert_eq!(board.user_rank("c"), Some(3));
        assert_eq!(board.user_rank("zed"), None);
    }

    #[test]
    fn test_user_rank_matches_top_n_position() {
        let board = board(vec![
            entry("fast", 50.4, 85.0, 0),
            entry("steady", 49.6, 99.0, 1),
            entry("other", 50.1, 90.0, 2),
        ]);

        let top = board.top_n(3);
        for user in ["fast", "steady", "other"] {
            let pos = top.iter().position(|e| e.user_id == user).unwrap() + 1;
            assert_eq!(board.user_rank(user), Some(pos));
        }
    }

    #[test]
    fn test_user_scores_most_recent_first() {
        let board = board(vec![
            entry("a", 30.0, 90.0, 5),
            entry("a", 50.0, 90.0, 1),
            entry("b", 60.0, 90.0, 3),
            entry("a", 40.0, 90.0, 9),
        ]);

        assert_eq!(wpms(&board.user_scores("a")), vec![40.0, 30.0, 50.0]);
        assert!(board.user_scores("nobody").is_empty());
    }

    #[test]
    fn test_top_n_by_mode_filters_and_sorts_exactly() {
        let board = board(vec![
            entry("a", 40.0, 90.0, 0),
            practice("b", 99.0, 99.0, 1),
            entry("c", 40.0, 95.0, 2),
            entry("d", 40.4, 50.0, 3),
            practice("e", 20.0, 99.0, 4),
        ]);

        let timed = board.top_n_by_mode(GameMode::Timed, 10);
        assert_eq!(users(&timed), vec!["d", "c", "a"]);
        assert_eq!(timed[2].rank, Some(3));

        let practice = board.top_n_by_mode(GameMode::FreePractice, 1);
        assert_eq!(users(&practice), vec!["b"]);
        assert_eq!(practice[0].rank, Some(1));
    }

    #[test]
    fn test_standings_break_full_ties_by_recency() {
        let board = board(vec![
            entry("old", 40.0, 90.0, 0),
            entry("new", 40.0, 90.0, 9),
            entry("top", 41.0, 10.0, 5),
        ]);

        assert_eq!(users(&board.standings()), vec!["top", "new", "old"]);
        // bucket walk keeps insertion order for the same tie
        assert_eq!(users(&board.top_n(3)), vec!["top", "old", "new"]);
    }

    #[test]
    fn test_scores_in_range_uses_buckets() {
        let board = board(vec![
            entry("a", 29.6, 90.0, 0),
            entry("b", 35.0, 90.0, 1),
            entry("c", 40.4, 90.0, 2),
            entry("d", 40.6, 90.0, 3),
            entry("e", 10.0, 90.0, 4),
        ]);

        // 29.6 rounds into range; 40.6 rounds out of it
        let in_range = board.scores_in_range(30, 40);
        assert_eq!(users(&in_range), vec!["c", "b", "a"]);
        assert!(in_range.iter().all(|e| e.rank.is_none()));

        assert_eq!(board.scores_in_range(41, 41).len(), 1);
        assert!(board.scores_in_range(50, 60).is_empty());
        assert!(board.scores_in_range(40, 30).is_empty());
    }

    #[test]
    fn test_clear_user_removes_from_every_index() {
        let mut board = board(vec![
            entry("a", 30.0, 90.0, 0),
            entry("b", 30.2, 90.0, 1),
            entry("a", 77.0, 90.0, 2),
            entry("c", 50.0, 90.0, 3),
        ]);
        let before = board.total_count();

        let removed = board.clear_user("a");

        assert_eq!(removed, 2);
        assert_eq!(board.total_count(), before - 2);
        assert_eq!(board.user_best("a"), None);
        assert_eq!(board.user_rank("a"), None);
        assert_eq!(board.unique_user_count(), 2);
        assert!(!board.by_bucket.contains_key(&Reverse(77)));
        assert_eq!(board.by_bucket[&Reverse(30)].len(), 1);
        assert_eq!(board.highest_wpm(), 50.0);
        assert_indexes_consistent(&board);
    }

    #[test]
    fn test_clear_unknown_user_is_noop() {
        let mut board = board(vec![entry("a", 30.0, 90.0, 0)]);

        assert_eq!(board.clear_user("zed"), 0);
        assert_eq!(board.total_count(), 1);
        assert_indexes_consistent(&board);
    }

    #[test]
    fn test_clear_all() {
        let mut board = board(vec![entry("a", 30.0, 90.0, 0), entry("b", 60.0, 90.0, 1)]);

        board.clear_all();

        assert!(board.is_empty());
        assert!(board.by_bucket.is_empty());
        assert_eq!(board.unique_user_count(), 0);
        assert!(board.top_n(3).is_empty());
    }

    #[test]
    fn test_aggregates() {
        let board = board(vec![
            entry("a", 30.0, 90.0, 0),
            entry("b", 60.4, 90.0, 1),
            entry("a", 60.2, 99.0, 2),
            entry("c", 10.2, 90.0, 3),
        ]);

        assert_eq!(board.highest_wpm(), 60.4);
        // 160.8 / 4
        assert_eq!(board.average_wpm(), 40.2);
        assert_eq!(board.total_count(), 4);
        assert_eq!(board.unique_user_count(), 3);
        assert_eq!(
            board.statistics(),
            "Total Scores: 4 | Unique Players: 3 | Highest WPM: 60.4 | Average WPM: 40.2"
        );
    }

    #[test]
    fn test_indexes_stay_consistent_across_operations() {
        let mut board = Leaderboard::new();
        let users = ["a", "b", "c"];
        for i in 0..30u32 {
            let user = users[(i % 3) as usize];
            board
                .add(entry(user, 20.0 + (i as f64) * 1.7, 80.0 + (i % 7) as f64, i))
                .unwrap();
            assert_indexes_consistent(&board);
        }

        board.clear_user("b");
        assert_indexes_consistent(&board);
        assert_eq!(board.total_count(), 20);
        assert!(board.chronological().all(|e| e.user_id != "b"));
    }
}
