//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied time deltas only
//! - Injected, seeded randomness only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod board;
pub mod duel;
pub mod dungeon;
pub mod entity;
pub mod resolve;
pub mod rules;
pub mod session;
pub mod snake;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use board::Board;
pub use duel::{Duel, DuelAction, Monster, MonsterKind};
pub use dungeon::{Dungeon, FloorEvent};
pub use entity::{AnswerPayload, Entity, EntityId, EntityState};
pub use resolve::{PlayerInput, Resolution};
pub use rules::{
    Axis, BoundaryEffect, BoundaryRule, ChoiceCount, Countdown, Crossing, GameRules, Layout,
    MatchRule, MovementRule, Penalties, Penalty, RigKind, ScoringRule, SpawnPrecondition,
    SpawnRule, SpawnShape, StatKey,
};
pub use session::{Session, SessionSetup};
pub use snake::Snake;
pub use state::{
    Counters, Direction, FinalSummary, Phase, Rig, RunState, SessionEvent, Snapshot, StatValue,
    TerminalReason,
};
