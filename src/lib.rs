//! Base Arcade - arithmetic drills in binary, octal, decimal and hex
//!
//! Core modules:
//! - `question`: Question generator (pure, injectable randomness)
//! - `sim`: Deterministic timed-challenge engine (rules, session, tick, input)
//! - `games`: The ten mini-games as rule presets
//! - `quiz`: Structured ten-question quiz
//! - `driver`: Fixed-step frame loop over a cancellable host scheduler
//! - `highscores`: Score sink contract and per-mode leaderboard
//! - `settings`: Persisted setup selection

pub mod difficulty;
pub mod driver;
pub mod error;
pub mod games;
pub mod highscores;
pub mod numeral;
pub mod question;
pub mod quiz;
pub mod rng;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use difficulty::{Difficulty, DifficultyConfig};
pub use driver::{FrameScheduler, LoopDriver};
pub use error::{ConfigError, SettingsError, SinkError};
pub use games::GameKind;
pub use highscores::{HighScores, ScoreSink};
pub use numeral::NumeralBase;
pub use question::{Operator, Question};
pub use quiz::{QuizMode, QuizSession};
pub use rng::RandomSource;
pub use settings::Settings;

/// Loop configuration constants
pub mod consts {
    /// Fixed simulation step (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Longest host frame simulated; longer stalls are dropped
    pub const MAX_FRAME_MS: f32 = 100.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Field extent on both axes
    pub const FIELD_SIZE: f32 = 100.0;
}
