use super::Leaderboard;
use serde::Serialize;
use std::io;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    user: &'a str,
    wpm: f64,
    accuracy: f64,
    mode: String,
    date: String,
}

impl Leaderboard {
    /// Plain-text table of the current top `limit` entries.
    pub fn render(&self, limit: usize) -> String {
        let mut out = format!("=== LEADERBOARD (Top {limit}) ===\n");
        out.push_str(&format!(
            "{:<5} {:<15} {:<8} {:<10} {:<15}\n",
            "Rank", "Player", "WPM", "Accuracy", "Mode"
        ));
        out.push_str(&"-".repeat(60));
        out.push('\n');

        for entry in self.top_n(limit) {
            out.push_str(&format!(
                "{:<5} {:<15} {:<8.1} {:<10} {:<15}\n",
                entry.rank.unwrap_or(0),
                entry.user_id,
                entry.wpm,
                format!("{:.1}%", entry.accuracy),
                entry.mode.display_name()
            ));
        }

        out
    }

    /// Write the current top `limit` entries as CSV, header included.
    pub fn write_csv<W: io::Write>(&self, writer: W, limit: usize) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        for entry in self.top_n(limit) {
            wtr.serialize(CsvRow {
                rank: entry.rank.unwrap_or(0),
                user: &entry.user_id,
                wpm: entry.wpm,
                accuracy: entry.accuracy,
                mode: entry.mode.to_string(),
                date: entry.created_at.to_rfc3339(),
            })?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::leaderboard::{Leaderboard, RankedEntry};
    use crate::mode::GameMode;
    use chrono::{Local, TimeZone};

    fn sample() -> Leaderboard {
        let at = Local.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap();
        let mut board = Leaderboard::new();
        board
            .add(RankedEntry::new("hana", 62.5, 97.3, GameMode::Timed, at))
            .unwrap();
        board
            .add(RankedEntry::new("ivan", 48.0, 91.0, GameMode::FreePractice, at))
            .unwrap();
        board
    }

    #[test]
    fn test_render_table() {
        let table = sample().render(5);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "=== LEADERBOARD (Top 5) ===");
        assert!(lines[1].starts_with("Rank  Player"));
        assert_eq!(lines[2], "-".repeat(60));
        assert!(lines[3].starts_with("1     hana            62.5     97.3%"));
        assert!(lines[3].trim_end().ends_with("Timed Mode"));
        assert!(lines[4].starts_with("2     ivan"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_render_respects_limit() {
        let table = sample().render(1);
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf, 10).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("rank,user,wpm,accuracy,mode,date"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("1,hana,62.5,97.3,TIMED,2024-06-02T09:30:00"));
        let second = lines.next().unwrap();
        assert!(second.starts_with("2,ivan,48.0,91.0,FREE_PRACTICE,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_csv_empty_board_writes_nothing() {
        let mut buf = Vec::new();
        Leaderboard::new().write_csv(&mut buf, 10).unwrap();
        assert!(buf.is_empty());
    }
}
