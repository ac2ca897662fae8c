//! Run state and session-facing records
//!
//! Everything a host reads back from a session lives here.

use std::collections::BTreeMap;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::dungeon::Dungeon;
use super::duel::Duel;
use super::entity::Entity;
use super::resolve::Resolution;
use super::rules::MatchRule;
use super::snake::Snake;
use crate::difficulty::Difficulty;
use crate::numeral::NumeralBase;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Built and validated, waiting for `start`
    #[default]
    Idle,
    /// Ticking and accepting input
    Running,
    /// Absorbing end state
    Terminal,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    HealthDepleted,
    TimeExpired,
    BoardFull,
    /// An entity reached the danger zone, or the snake hit a wall or itself
    Breached,
    /// A fixed-length run (the structured quiz) finished
    Completed,
}

impl TerminalReason {
    /// Evaluation order when several predicates hold in the same step
    pub const PRIORITY: [TerminalReason; 4] = [
        TerminalReason::HealthDepleted,
        TerminalReason::TimeExpired,
        TerminalReason::BoardFull,
        TerminalReason::Breached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::HealthDepleted => "health_depleted",
            TerminalReason::TimeExpired => "time_expired",
            TerminalReason::BoardFull => "board_full",
            TerminalReason::Breached => "breached",
            TerminalReason::Completed => "completed",
        }
    }
}

/// Steering direction for grid games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Cell delta; y grows downward
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Outcome tallies for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub correct: u32,
    pub incorrect: u32,
    pub missed: u32,
    pub expired: u32,
}

/// Mutable per-run state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Never below zero
    pub score: u64,
    pub lives: u32,
    pub max_lives: u32,
    pub combo: u32,
    pub best_combo: u32,
    /// Spawn waves created so far
    pub wave: u32,
    /// Entities spawned so far
    pub spawns: u32,
    pub counters: Counters,
    pub countdown_ms: Option<f32>,
    pub elapsed_ms: f32,
    /// Tick counter, incremented at the start of every tick
    pub ticks: u64,
    /// Time since the last cadence spawn
    pub spawn_timer_ms: f32,
    /// Breach predicate raised during the current step
    pub breached: bool,
    /// Latched on first terminal predicate
    pub terminal: Option<TerminalReason>,
}

impl RunState {
    pub fn new(lives: u32, countdown_ms: Option<f32>) -> Self {
        Self {
            score: 0,
            lives,
            max_lives: lives,
            combo: 0,
            best_combo: 0,
            wave: 0,
            spawns: 0,
            counters: Counters::default(),
            countdown_ms,
            elapsed_ms: 0.0,
            ticks: 0,
            spawn_timer_ms: 0.0,
            breached: false,
            terminal: None,
        }
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }

    pub fn deduct_score(&mut self, amount: u64) {
        self.score = self.score.saturating_sub(amount);
    }

    pub fn lose_lives(&mut self, amount: u32) {
        self.lives = self.lives.saturating_sub(amount);
    }

    pub fn register_correct(&mut self) {
        self.counters.correct += 1;
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);
    }

    pub fn break_combo(&mut self) {
        self.combo = 0;
    }

    /// Add to the countdown, clamped to `max_ms`
    pub fn extend_countdown(&mut self, amount_ms: f32, max_ms: f32) {
        if let Some(ms) = self.countdown_ms.as_mut() {
            *ms = (*ms + amount_ms).min(max_ms);
        }
    }

    pub fn cut_countdown(&mut self, amount_ms: f32) {
        if let Some(ms) = self.countdown_ms.as_mut() {
            *ms = (*ms - amount_ms).max(0.0);
        }
    }
}

/// Per-game player-side state stepped by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rig {
    None,
    Snake(Snake),
    Board(Board),
    Duel(Duel),
    Dungeon(Dungeon),
}

/// Auxiliary stat value: integers and display strings share one open map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Text(String),
}

impl From<u32> for StatValue {
    fn from(v: u32) -> Self {
        StatValue::Int(v as i64)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

/// Record handed to the score sink once per finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    pub mode: String,
    pub score: u64,
    pub base: NumeralBase,
    pub difficulty: Difficulty,
    pub reason: TerminalReason,
    pub stats: BTreeMap<String, StatValue>,
}

/// Render-ready copy of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: String,
    pub phase: Phase,
    pub base: NumeralBase,
    pub matching: MatchRule,
    pub run: RunState,
    pub entities: Vec<Entity>,
    pub rig: Rig,
}

/// Notifications delivered to session observers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Spawned { wave: u32, count: usize },
    Resolved(Resolution),
    LivesChanged { lives: u32 },
    Terminal(TerminalReason),
    Finalized(FinalSummary),
}
