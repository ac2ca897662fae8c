//! Difficulty presets
//!
//! The setup screen picks `easy | medium | hard`; the session works from the
//! numeric `DifficultyConfig` snapshot taken once at session start.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::question::Operator;

/// Difficulty level chosen by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Numeric snapshot for arcade sessions
    pub fn config(&self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => DifficultyConfig {
                min_value: 1,
                max_value: 15,
                operators: vec![Operator::Add],
                multiply_limit: 4,
                distractor_spread: 3,
                speed_multiplier: 1.0,
                score_multiplier: 1.0,
            },
            Difficulty::Medium => DifficultyConfig {
                min_value: 1,
                max_value: 50,
                operators: vec![Operator::Add, Operator::Subtract],
                multiply_limit: 8,
                distractor_spread: 15,
                speed_multiplier: 1.5,
                score_multiplier: 2.0,
            },
            Difficulty::Hard => DifficultyConfig {
                min_value: 1,
                max_value: 255,
                operators: vec![
                    Operator::Add,
                    Operator::Subtract,
                    Operator::Multiply,
                    Operator::Modulo,
                ],
                multiply_limit: 12,
                distractor_spread: 15,
                speed_multiplier: 2.5,
                score_multiplier: 3.0,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "med" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ConfigError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Immutable per-session difficulty snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Smallest operand
    pub min_value: u64,
    /// Largest operand
    pub max_value: u64,
    /// Operators the generator may pick from (uniformly)
    pub operators: Vec<Operator>,
    /// Multiplication operands are resampled into `[max(2, min_value), multiply_limit]`
    pub multiply_limit: u64,
    /// Largest distractor offset from the correct value
    pub distractor_spread: u64,
    /// Scales spawn cadence (inversely) and movement
    pub speed_multiplier: f32,
    /// Scales every score award
    pub score_multiplier: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Difficulty::Easy.config()
    }
}

impl DifficultyConfig {
    /// Reject configurations the generator or engine could only fail on later
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operators.is_empty() {
            return Err(ConfigError::EmptyOperatorSet);
        }
        if self.min_value > self.max_value || self.max_value == 0 {
            return Err(ConfigError::InvalidRange {
                min: self.min_value,
                max: self.max_value,
            });
        }
        if self.multiply_limit < 2 {
            return Err(ConfigError::InvalidRange {
                min: 2,
                max: self.multiply_limit,
            });
        }
        if self.distractor_spread == 0 {
            return Err(ConfigError::NonPositive {
                name: "distractor_spread",
                value: 0.0,
            });
        }
        check_positive("speed_multiplier", self.speed_multiplier)?;
        check_positive("score_multiplier", self.score_multiplier)?;
        Ok(())
    }

    /// Milliseconds of a configured interval after speed scaling
    pub fn scaled_interval(&self, base_ms: f32) -> f32 {
        base_ms / self.speed_multiplier
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
