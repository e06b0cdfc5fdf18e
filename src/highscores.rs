//! High score tables
//!
//! Scores are survival times. Every (level, difficulty) pair has its own table,
//! addressed by a validator key, and keeps the top 10 times.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep per table
pub const MAX_HIGH_SCORES: usize = 10;

/// Identifies one score table
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreKey {
    pub level_id: String,
    pub difficulty_mult: f32,
}

impl ScoreKey {
    pub fn new(level_id: impl Into<String>, difficulty_mult: f32) -> Self {
        Self {
            level_id: level_id.into(),
            difficulty_mult,
        }
    }

    /// Storage key, e.g. `hexagon_m_1.5`
    pub fn validator(&self) -> String {
        format!("{}_m_{}", self.level_id, self.difficulty_mult)
    }
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Survival time (seconds)
    pub time: f32,
    /// Difficulty increments reached
    pub increments: u32,
}

/// One leaderboard, sorted best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a time qualifies for the leaderboard
    pub fn qualifies(&self, time: f32) -> bool {
        if !time.is_finite() || time <= 0.0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if time beats the lowest entry
        self.entries.last().map(|e| time > e.time).unwrap_or(true)
    }

    /// Add a new time to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add(&mut self, time: f32, increments: u32) -> Option<usize> {
        if !self.qualifies(time) {
            return None;
        }

        let entry = HighScoreEntry { time, increments };

        // Find insertion point (sorted descending by time)
        let pos = self.entries.iter().position(|e| time > e.time);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<f32> {
        self.entries.first().map(|e| e.time)
    }
}

/// Persistent score storage boundary
pub trait ScoreSink {
    /// Best recorded time for `key`
    fn best(&self, key: &ScoreKey) -> Option<f32>;
    /// Record a finished run; returns true when it is a new best
    fn submit(&mut self, key: &ScoreKey, time: f32, increments: u32) -> bool;
}

/// Score tables for every level and difficulty, optionally backed by a file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBoard {
    tables: BTreeMap<String, HighScores>,
    path: Option<PathBuf>,
}

impl ScoreBoard {
    /// In-memory board
    pub fn new() -> Self {
        Self::default()
    }

    /// Board persisted at `path`; a missing or malformed file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tables = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<BTreeMap<String, HighScores>>(&json) {
                Ok(tables) => {
                    log::info!("Loaded {} score tables", tables.len());
                    tables
                }
                Err(e) => {
                    log::warn!("Malformed score file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => {
                log::info!("No high scores found, starting fresh");
                BTreeMap::new()
            }
        };
        Self {
            tables,
            path: Some(path),
        }
    }

    pub fn table(&self, key: &ScoreKey) -> Option<&HighScores> {
        self.tables.get(&key.validator())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.tables)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved ({} tables)", self.tables.len());
        Ok(())
    }

    fn persist(&self) {
        if let Some(path) = &self.path {
            if let Err(e) = self.save_to(path) {
                log::warn!("Failed to save scores to {}: {}", path.display(), e);
            }
        }
    }
}

impl ScoreSink for ScoreBoard {
    fn best(&self, key: &ScoreKey) -> Option<f32> {
        self.table(key).and_then(HighScores::best)
    }

    fn submit(&mut self, key: &ScoreKey, time: f32, increments: u32) -> bool {
        let previous = self.best(key);
        let table = self.tables.entry(key.validator()).or_default();
        let rank = table.add(time, increments);
        if rank.is_some() {
            self.persist();
        }
        rank == Some(1) && previous.is_none_or(|best| time > best)
    }
}

/// Format a survival time for the HUD (`12.345`)
pub fn format_time(time: f32) -> String {
    format!("{:.3}", time.max(0.0))
}
