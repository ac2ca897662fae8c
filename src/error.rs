//! Error types
//!
//! Configuration problems are caught before a session ever enters `Running`;
//! the engine itself has no recoverable runtime errors.

use thiserror::Error;

/// Invalid setup: rejected at session-start validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unsupported numeral base {0} (expected 2, 8, 10 or 16)")]
    InvalidBase(u32),

    #[error("difficulty allows no operators")]
    EmptyOperatorSet,

    #[error("invalid value range [{min}, {max}]")]
    InvalidRange { min: u64, max: u64 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),

    #[error("unknown game '{0}'")]
    UnknownGame(String),

    #[error("unknown quiz mode '{0}'")]
    UnknownQuizMode(String),

    #[error("invalid game rules: {0}")]
    InvalidRules(String),
}

/// Loading or saving persisted settings/high scores
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The persistence collaborator refused or could not take a final score
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("score sink is unavailable: {0}")]
    Unavailable(String),

    #[error("score rejected: {0}")]
    Rejected(String),
}
