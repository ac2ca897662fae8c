//! Score sink contract and per-mode leaderboard
//!
//! The engine hands each final summary to a `ScoreSink` exactly once. The
//! leaderboard is one such sink; it keeps the top 10 scores of every mode and
//! persists to LocalStorage on wasm32 or a JSON file natively.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use crate::error::SettingsError;
use crate::error::SinkError;
use crate::sim::{FinalSummary, StatValue, TerminalReason};

/// Maximum number of high scores kept per mode
pub const MAX_HIGH_SCORES: usize = 10;

/// Persistence collaborator receiving final summaries
pub trait ScoreSink {
    fn submit(&mut self, summary: &FinalSummary) -> Result<(), SinkError>;
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub reason: TerminalReason,
    #[serde(default)]
    pub stats: BTreeMap<String, StatValue>,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, keyed by mode slug
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    pub modes: BTreeMap<String, Vec<HighScoreEntry>>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "base_arcade_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one mode, best first
    pub fn entries(&self, mode: &str) -> &[HighScoreEntry] {
        self.modes.get(mode).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a score qualifies for a mode's leaderboard
    pub fn qualifies(&self, mode: &str, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let entries = self.entries(mode);
        if entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, mode: &str, score: u64) -> Option<usize> {
        if !self.qualifies(mode, score) {
            return None;
        }
        let entries = self.entries(mode);
        let rank = entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(entries.len()) + 1)
    }

    /// Insert a summary if it qualifies; returns the rank achieved
    pub fn add(&mut self, summary: &FinalSummary, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(&summary.mode, summary.score)?;
        let entries = self.modes.entry(summary.mode.clone()).or_default();
        entries.insert(
            rank - 1,
            HighScoreEntry {
                score: summary.score,
                reason: summary.reason,
                stats: summary.stats.clone(),
                timestamp,
            },
        );
        entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.modes.values().all(Vec::is_empty)
    }

    pub fn top_score(&self, mode: &str) -> Option<u64> {
        self.entries(mode).first().map(|e| e.score)
    }

    /// Load high scores from a JSON file; a missing file is an empty board
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let scores: HighScores = serde_json::from_str(&json)?;
                log::info!("Loaded high scores for {} modes", scores.modes.len());
                Ok(scores)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved to {}", path.display());
        Ok(())
    }

    /// Load high scores from LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                    log::info!("Loaded high scores for {} modes", scores.modes.len());
                    return scores;
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SinkError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| SinkError::Unavailable("no LocalStorage".into()))?;
        let json = serde_json::to_string(self).map_err(|e| SinkError::Rejected(e.to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| SinkError::Unavailable("LocalStorage write failed".into()))?;
        log::info!("High scores saved");
        Ok(())
    }
}

/// Wall-clock milliseconds since the Unix epoch
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

impl ScoreSink for HighScores {
    fn submit(&mut self, summary: &FinalSummary) -> Result<(), SinkError> {
        match self.add(summary, now_ms()) {
            Some(rank) => {
                log::info!("'{}' score {} ranked #{rank}", summary.mode, summary.score);
                #[cfg(target_arch = "wasm32")]
                self.save()?;
                Ok(())
            }
            None => Err(SinkError::Rejected(format!(
                "{} does not place on the '{}' board",
                summary.score, summary.mode
            ))),
        }
    }
}

/// Shared sink: the host keeps a handle to read the board back
impl<S: ScoreSink> ScoreSink for Rc<RefCell<S>> {
    fn submit(&mut self, summary: &FinalSummary) -> Result<(), SinkError> {
        self.borrow_mut().submit(summary)
    }
}

/// Forward summaries to another thread
impl ScoreSink for mpsc::Sender<FinalSummary> {
    fn submit(&mut self, summary: &FinalSummary) -> Result<(), SinkError> {
        self.send(summary.clone())
            .map_err(|_| SinkError::Unavailable("receiver dropped".into()))
    }
}
