//! Answer-bearing entities
//!
//! The session owns the entity list; hosts only ever see clones in a
//! `Snapshot`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::numeral::NumeralBase;
use crate::question::Question;

/// Entity identifier, allocated monotonically per session and never reused
pub type EntityId = u32;

/// Lifecycle of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityState {
    /// Live and matchable
    Alive,
    /// Matched correctly, removed once the grace period has elapsed
    Resolving { elapsed_ms: f32 },
    /// Crossed a boundary, ran out of time or was cleared with its wave
    Expired,
}

/// What the player has to match against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnswerPayload {
    /// Typing games: the full question, answered by typing its result
    Question(Question),
    /// Multi-target games: one option out of a wave sharing one question
    Option { label: String, is_correct: bool },
}

/// A spawned, possibly moving, answer-bearing object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Field coordinates (0..100 on both axes); grid games store whole cells
    pub pos: Vec2,
    pub payload: AnswerPayload,
    pub state: EntityState,
    /// Spawn wave this entity belongs to
    pub wave: u32,
    /// Per-entity speed factor applied on top of the difficulty multiplier
    pub speed: f32,
    pub lane: Option<usize>,
    /// Tick in which the entity was created
    pub born_tick: u64,
    pub age_ms: f32,
    /// Lifetime after which the entity expires
    pub ttl_ms: Option<f32>,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, payload: AnswerPayload, wave: u32, born_tick: u64) -> Self {
        Self {
            id,
            pos,
            payload,
            state: EntityState::Alive,
            wave,
            speed: 1.0,
            lane: None,
            born_tick,
            age_ms: 0.0,
            ttl_ms: None,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state == EntityState::Alive
    }

    /// Whether choosing this entity is the right answer
    pub fn is_correct(&self) -> bool {
        match &self.payload {
            AnswerPayload::Question(_) => true,
            AnswerPayload::Option { is_correct, .. } => *is_correct,
        }
    }

    /// Text the render layer shows on the entity
    pub fn label(&self) -> &str {
        match &self.payload {
            AnswerPayload::Question(q) => q.expression(),
            AnswerPayload::Option { label, .. } => label,
        }
    }

    /// Whether a typed answer solves this entity's question
    pub fn accepts(&self, normalized: &str) -> bool {
        match &self.payload {
            AnswerPayload::Question(q) => q.correct_answer() == normalized,
            AnswerPayload::Option { .. } => false,
        }
    }

    /// The answer the player is after, in display form
    pub fn answer(&self) -> Option<String> {
        match &self.payload {
            AnswerPayload::Question(q) => Some(q.correct_answer()),
            AnswerPayload::Option { label, is_correct: true } => Some(label.clone()),
            AnswerPayload::Option { .. } => None,
        }
    }

    /// Remaining lifetime, if the entity has one
    pub fn remaining_ms(&self) -> Option<f32> {
        self.ttl_ms.map(|ttl| (ttl - self.age_ms).max(0.0))
    }

    /// Grid cell for grid games
    pub fn cell(&self) -> glam::IVec2 {
        self.pos.round().as_ivec2()
    }

    /// Base the payload is rendered in
    pub fn base(&self) -> Option<NumeralBase> {
        match &self.payload {
            AnswerPayload::Question(q) => Some(q.base()),
            AnswerPayload::Option { .. } => None,
        }
    }
}
