//! Game rules: the capability set every mini-game parameterizes
//!
//! A mini-game is a `GameRules` value. The engine interprets it; nothing here
//! runs on its own.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When the cadence timer may spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPrecondition {
    /// Every interval
    Always,
    /// Only when nothing is alive; correct answers respawn immediately
    NoneAlive,
    /// Never on the timer; the rig spawns
    Manual,
}

/// Where option entities of one wave are placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Layout {
    /// Evenly spaced along one row
    Slots { y: f32 },
    /// Uniformly inside a rectangle
    Scatter { x: (f32, f32), y: (f32, f32) },
    /// Free grid cells of the snake field
    Cells,
}

/// How many options a wave carries: `base + wave / per_waves`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCount {
    pub base: usize,
    pub per_waves: u32,
    pub max: usize,
}

impl ChoiceCount {
    pub const fn fixed(n: usize) -> Self {
        Self {
            base: n,
            per_waves: 0,
            max: n,
        }
    }

    pub fn for_wave(&self, wave: u32) -> usize {
        let growth = match self.per_waves {
            0 => 0,
            n => (wave / n) as usize,
        };
        (self.base + growth).min(self.max)
    }
}

/// Shape of one spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnShape {
    /// One typed question at a random x
    Single { x: (f32, f32), y: f32 },
    /// One typed question in a random free lane; a lane stays busy while an
    /// alive entity in it is still beyond `busy_x`
    Lanes { ys: Vec<f32>, x: f32, busy_x: f32 },
    /// One question split into options
    Choices {
        count: ChoiceCount,
        layout: Layout,
        /// Distractor spread; falls back to the difficulty's spread
        spread: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// Cadence before speed scaling
    pub interval_ms: f32,
    pub precondition: SpawnPrecondition,
    pub shape: SpawnShape,
    /// Spawn once during `start`
    pub on_start: bool,
    /// Lifetime of each entity before speed scaling
    pub lifetime_ms: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementRule {
    Static,
    /// Field units per second; each entity draws a speed factor from `jitter`
    Linear { velocity: Vec2, jitter: Option<(f32, f32)> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossing {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryEffect {
    /// Ends the run
    Breach,
    /// Applies the expire penalty once per wave
    Penalize,
    /// Silently expires the entity
    Expire,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRule {
    pub axis: Axis,
    pub crossing: Crossing,
    pub limit: f32,
    pub effect: BoundaryEffect,
}

impl BoundaryRule {
    pub fn crossed(&self, pos: Vec2) -> bool {
        let v = match self.axis {
            Axis::X => pos.x,
            Axis::Y => pos.y,
        };
        match self.crossing {
            Crossing::AtLeast => v >= self.limit,
            Crossing::AtMost => v <= self.limit,
        }
    }
}

/// Which inputs resolve against entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRule {
    /// Typed answers against question entities
    Typed,
    /// Picks by id or taps by coordinate against option entities
    Pick,
    /// Directions drive the rig
    Steer,
    /// Duel actions open a typed question
    Duel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub base_award: f32,
    /// Bonus fraction per combo step
    pub combo_step: f32,
    pub combo_cap: u32,
    /// Points per remaining second of entity lifetime
    pub time_bonus_per_sec: f32,
}

impl Default for ScoringRule {
    fn default() -> Self {
        Self {
            base_award: 10.0,
            combo_step: 0.0,
            combo_cap: 0,
            time_bonus_per_sec: 0.0,
        }
    }
}

impl ScoringRule {
    /// `round(base · mult · (1 + min(combo, cap) · step)) + time bonus`
    pub fn award(&self, combo: u32, score_multiplier: f32, remaining_ms: Option<f32>) -> u64 {
        let bonus = 1.0 + combo.min(self.combo_cap) as f32 * self.combo_step;
        let main = (self.base_award * score_multiplier * bonus).round();
        let time = remaining_ms
            .map(|ms| (ms / 1000.0 * self.time_bonus_per_sec * score_multiplier).round())
            .unwrap_or(0.0);
        (main + time).max(0.0) as u64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub lives: u32,
    pub time_ms: f32,
    pub score: u64,
    /// Expire the rest of the wave and let the next one spawn
    pub clear_wave: bool,
}

impl Penalty {
    pub const NONE: Penalty = Penalty {
        lives: 0,
        time_ms: 0.0,
        score: 0,
        clear_wave: false,
    };

    pub const fn lives(n: u32) -> Self {
        Self {
            lives: n,
            time_ms: 0.0,
            score: 0,
            clear_wave: true,
        }
    }

    pub const fn time(ms: f32) -> Self {
        Self {
            lives: 0,
            time_ms: ms,
            score: 0,
            clear_wave: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Penalties {
    /// Wrong entity chosen
    pub wrong: Penalty,
    /// Input matched nothing
    pub miss: Penalty,
    /// Entity expired or hit a penalizing boundary
    pub expire: Penalty,
}

/// Run clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    /// Starting time before speed scaling
    pub start_ms: f32,
    pub max_ms: f32,
    /// Added per correct answer
    pub bonus_ms: f32,
    /// Replaces `bonus_ms` once the combo exceeds `streak_threshold`
    pub streak_bonus_ms: f32,
    pub streak_threshold: u32,
}

/// Which rig a game steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RigKind {
    None,
    Snake { grid: i32, step_ms: f32 },
    Board { size: usize },
    Duel,
    Dungeon,
}

/// Complete parameterization of one mini-game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub lives: u32,
    pub countdown: Option<Countdown>,
    pub spawn: SpawnRule,
    pub movement: MovementRule,
    pub boundary: Option<BoundaryRule>,
    pub matching: MatchRule,
    pub scoring: ScoringRule,
    pub penalties: Penalties,
    /// Grace period of `Resolving` entities
    pub resolve_grace_ms: f32,
    /// Tap hit radius in field units
    pub hit_radius: f32,
    pub rig: RigKind,
    /// Auxiliary stats reported in the final summary
    pub stats: Vec<StatKey>,
}

/// Named auxiliary stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKey {
    Solved,
    Destroyed,
    Wave,
    WiresCut,
    BestCombo,
    BestStreak,
    Length,
    MaxTile,
    Moves,
    Level,
    Floor,
}

impl StatKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Solved => "solved",
            StatKey::Destroyed => "destroyed",
            StatKey::Wave => "wave",
            StatKey::WiresCut => "wires_cut",
            StatKey::BestCombo => "best_combo",
            StatKey::BestStreak => "best_streak",
            StatKey::Length => "length",
            StatKey::MaxTile => "max_tile",
            StatKey::Moves => "moves",
            StatKey::Level => "level",
            StatKey::Floor => "floor",
        }
    }
}

impl GameRules {
    /// Reject rule sets the engine could only trip over mid-run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |msg: &str| Err(ConfigError::InvalidRules(msg.to_string()));

        if self.lives == 0 {
            return bad("lives must be at least 1");
        }
        if !(self.spawn.interval_ms.is_finite() && self.spawn.interval_ms >= 0.0) {
            return bad("spawn interval must be a finite non-negative duration");
        }
        if let Some(ttl) = self.spawn.lifetime_ms {
            if !(ttl.is_finite() && ttl > 0.0) {
                return bad("entity lifetime must be positive");
            }
        }
        if !(self.resolve_grace_ms.is_finite() && self.resolve_grace_ms >= 0.0) {
            return bad("resolve grace must be non-negative");
        }
        if let Some(c) = &self.countdown {
            if !(c.start_ms > 0.0 && c.max_ms >= c.start_ms) {
                return bad("countdown must start positive and not exceed its maximum");
            }
        }
        if self.scoring.base_award < 0.0 || self.scoring.combo_step < 0.0 {
            return bad("scoring values must be non-negative");
        }

        match &self.spawn.shape {
            SpawnShape::Lanes { ys, .. } if ys.is_empty() => return bad("lane spawn needs lanes"),
            SpawnShape::Choices { count, .. } if count.base < 2 || count.max < count.base => {
                return bad("a choice wave needs at least two options");
            }
            SpawnShape::Choices { spread: Some(0), .. } => return bad("distractor spread must be positive"),
            _ => {}
        }

        let typed_shape = !matches!(self.spawn.shape, SpawnShape::Choices { .. });
        match (self.matching, self.rig) {
            (MatchRule::Typed, _) | (MatchRule::Duel, _) if !typed_shape => {
                return bad("typed matching needs question entities");
            }
            (MatchRule::Pick, _) if typed_shape => return bad("pick matching needs option entities"),
            (MatchRule::Steer, RigKind::Snake { .. } | RigKind::Board { .. }) => {}
            (MatchRule::Steer, _) => return bad("steering needs a snake or board rig"),
            (MatchRule::Duel, RigKind::Duel) => {}
            (MatchRule::Duel, _) => return bad("duel matching needs the duel rig"),
            _ => {}
        }

        match self.rig {
            RigKind::Snake { grid, step_ms } => {
                if grid < 5 || !(step_ms > 0.0) {
                    return bad("snake needs a grid of at least 5 and a positive step");
                }
                if !matches!(
                    self.spawn.shape,
                    SpawnShape::Choices {
                        layout: Layout::Cells,
                        ..
                    }
                ) {
                    return bad("snake food must be placed on cells");
                }
            }
            RigKind::Board { size } if size < 2 => return bad("board needs at least 2x2 cells"),
            RigKind::Duel | RigKind::Dungeon | RigKind::Board { .. }
                if self.spawn.precondition != SpawnPrecondition::Manual =>
            {
                return bad("turn-based rigs spawn manually");
            }
            _ => {}
        }

        Ok(())
    }
}
