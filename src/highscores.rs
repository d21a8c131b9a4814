//! High score leaderboard
//!
//! Keeps the top 10 finished matches, stored as JSON next to the settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished match on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Stage reached (1-based)
    pub stage: usize,
    /// Name of the stage the match ended on
    #[serde(default)]
    pub stage_name: String,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: u64,
}

/// Leaderboard, highest score first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank (1-based) a score would take, or None if it misses the board.
    /// Ties rank below the entries already there.
    pub fn rank_for(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.score >= score);
        (idx < MAX_HIGH_SCORES).then_some(idx + 1)
    }

    /// Insert a finished match if it makes the board; returns its rank
    pub fn record(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let rank = self.rank_for(entry.score)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Load from a JSON file. Missing or unreadable files give an empty board.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No high scores at {}, starting fresh", path.display());
                return Self::new();
            }
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(err) => {
                log::warn!("Ignoring corrupt high score file {}: {}", path.display(), err);
                Self::new()
            }
        }
    }

    /// Write to a JSON file; failures are logged, not fatal
    pub fn save(&self, path: &Path) {
        let json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Could not encode high scores: {}", err);
                return;
            }
        };
        match std::fs::write(path, json) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(err) => log::warn!("Could not save high scores to {}: {}", path.display(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u64, stage: usize) -> HighScoreEntry {
        HighScoreEntry {
            score,
            stage,
            stage_name: format!("Stage {}", stage),
            timestamp: 0,
        }
    }

    #[test]
    fn test_zero_never_ranks() {
        assert_eq!(HighScores::new().rank_for(0), None);
    }

    #[test]
    fn test_sorted_insert_and_rank() {
        let mut scores = HighScores::new();
        assert_eq!(scores.record(entry(500, 1)), Some(1));
        assert_eq!(scores.record(entry(900, 2)), Some(1));
        assert_eq!(scores.record(entry(700, 2)), Some(2));
        // Equal score goes after the existing one
        assert_eq!(scores.record(entry(700, 3)), Some(3));
        let order: Vec<(u64, usize)> = scores.entries.iter().map(|e| (e.score, e.stage)).collect();
        assert_eq!(order, vec![(900, 2), (700, 2), (700, 3), (500, 1)]);
    }

    #[test]
    fn test_board_is_capped() {
        let mut scores = HighScores::new();
        for i in 1..=MAX_HIGH_SCORES as u64 {
            scores.record(entry(i * 100, 1));
        }
        assert_eq!(scores.rank_for(100), None);
        assert_eq!(scores.record(entry(50, 1)), None);
        assert_eq!(scores.record(entry(150, 1)), Some(MAX_HIGH_SCORES));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(150));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("tank_siege_scores_{}.json", std::process::id()));
        let mut scores = HighScores::new();
        scores.record(HighScoreEntry {
            score: 1200,
            stage: 3,
            stage_name: "Iron Lake".to_string(),
            timestamp: 1_700_000_000,
        });
        scores.save(&path);
        let loaded = HighScores::load(&path);
        assert_eq!(loaded.entries, scores.entries);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_entry_without_stage_name_loads() {
        let json = r#"{"entries":[{"score":300,"stage":1}]}"#;
        let scores: HighScores = serde_json::from_str(json).expect("old entries parse");
        assert_eq!(scores.entries[0].stage_name, "");
        assert_eq!(scores.entries[0].timestamp, 0);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let loaded = HighScores::load(Path::new("/nonexistent/tank_siege/scores.json"));
        assert!(loaded.entries.is_empty());
    }
}
