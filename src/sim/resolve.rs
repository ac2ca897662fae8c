//! Input resolution
//!
//! Inputs are resolved immediately against the current state. Unknown or
//! stale entities fall into the no-match path; nothing here panics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::duel::{ActionOutcome, DuelAction, HP_PER_LEVEL};
use super::entity::{EntityId, EntityState};
use super::rules::{MatchRule, ScoringRule, SpawnPrecondition};
use super::session::Session;
use super::state::{Direction, Phase, Rig, SessionEvent};
use crate::numeral::NumeralBase;
use crate::rng::RandomSource;

/// Duel victory bonus before the multiplier
pub const VICTORY_BONUS: f32 = 50.0;

/// One player submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Typed answer, any case
    Typed(String),
    /// Entity chosen by id
    Pick(EntityId),
    /// Tap or click in field coordinates
    Tap(Vec2),
    Steer(Direction),
    Act(DuelAction),
}

/// What an input did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Correct { id: EntityId, award: u64 },
    Incorrect { id: EntityId },
    /// Nothing matched; the combo is reset
    NoMatch,
    /// Accepted input that answers nothing (steering, opening a duel action)
    Applied,
    /// Not applicable to this game or the session is not running
    Ignored,
}

impl<R: RandomSource> Session<R> {
    /// Resolve one input against the current state
    pub fn submit(&mut self, input: PlayerInput) -> Resolution {
        if self.phase != Phase::Running {
            return Resolution::Ignored;
        }

        let resolution = match (self.rules.matching, input) {
            (MatchRule::Typed | MatchRule::Duel, PlayerInput::Typed(text)) => self.resolve_typed(&text),
            (MatchRule::Pick, PlayerInput::Pick(id)) => self.resolve_pick(id),
            (MatchRule::Pick, PlayerInput::Tap(at)) => match self.hit_test(at) {
                Some(id) => self.resolve_pick(id),
                None => self.resolve_miss(),
            },
            (MatchRule::Steer, PlayerInput::Steer(dir)) => self.steer(dir),
            (MatchRule::Duel, PlayerInput::Act(action)) => self.open_action(action),
            _ => Resolution::Ignored,
        };

        self.check_terminal();
        if self.phase == Phase::Running {
            self.refill();
        }
        resolution
    }

    /// Closest alive entity within the hit radius
    fn hit_test(&self, at: Vec2) -> Option<EntityId> {
        let radius = self.rules.hit_radius;
        self.entities
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| (e.id, e.pos.distance(at)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn resolve_typed(&mut self, text: &str) -> Resolution {
        let normalized = NumeralBase::normalize(text);
        if normalized.is_empty() {
            return Resolution::Ignored;
        }
        if self.rules.matching == MatchRule::Duel && !self.any_alive() {
            return Resolution::Ignored;
        }
        let hit = self
            .entities
            .iter()
            .find(|e| e.is_alive() && e.accepts(&normalized))
            .map(|e| e.id);
        match hit {
            Some(id) => self.resolve_correct(id),
            None => self.resolve_miss(),
        }
    }

    /// Resolve a chosen entity; stale ids take the no-match path
    pub(super) fn resolve_pick(&mut self, id: EntityId) -> Resolution {
        let correct = match self.entities.iter().find(|e| e.id == id && e.is_alive()) {
            Some(e) => e.is_correct(),
            None => return self.resolve_miss(),
        };
        if correct {
            self.resolve_correct(id)
        } else {
            self.resolve_incorrect(id)
        }
    }

    fn resolve_correct(&mut self, id: EntityId) -> Resolution {
        let base_award = match &self.rig {
            Rig::Duel(duel) => duel.pending.map(|a| a.award()),
            Rig::Dungeon(dungeon) => Some(dungeon.event.bonus()),
            _ => None,
        }
        .unwrap_or(self.rules.scoring.base_award);
        let scoring = ScoringRule {
            base_award,
            ..self.rules.scoring
        };

        let Some(entity) = self.entity_mut(id) else {
            return Resolution::NoMatch;
        };
        let wave = entity.wave;
        let remaining = entity.remaining_ms();
        entity.state = EntityState::Resolving { elapsed_ms: 0.0 };

        let mut award = scoring.award(self.run.combo, self.config.score_multiplier, remaining);
        self.run.register_correct();
        self.run.add_score(award);
        self.expire_wave(wave);

        if let Some(countdown) = self.rules.countdown {
            let bonus = if self.run.combo > countdown.streak_threshold {
                countdown.streak_bonus_ms
            } else {
                countdown.bonus_ms
            };
            let cap = self.config.scaled_interval(countdown.max_ms);
            self.run.extend_countdown(bonus, cap);
        }

        award += self.rig_after_answer(true);

        let resolution = Resolution::Correct { id, award };
        log::trace!("correct: entity {id} +{award}");
        self.emit(SessionEvent::Resolved(resolution.clone()));
        resolution
    }

    fn resolve_incorrect(&mut self, id: EntityId) -> Resolution {
        let Some(entity) = self.entity_mut(id) else {
            return Resolution::NoMatch;
        };
        let wave = entity.wave;
        entity.state = EntityState::Expired;

        self.run.counters.incorrect += 1;
        self.run.break_combo();
        let penalty = self.rules.penalties.wrong;
        self.apply_penalty(penalty, Some(wave));
        self.rig_after_answer(false);

        let resolution = Resolution::Incorrect { id };
        self.emit(SessionEvent::Resolved(resolution.clone()));
        resolution
    }

    fn resolve_miss(&mut self) -> Resolution {
        self.run.counters.missed += 1;
        self.run.break_combo();
        let penalty = self.rules.penalties.miss;
        self.apply_penalty(penalty, None);
        if matches!(self.rig, Rig::Duel(_)) {
            self.expire_all();
            self.rig_after_answer(false);
        }

        self.emit(SessionEvent::Resolved(Resolution::NoMatch));
        Resolution::NoMatch
    }

    /// Per-rig consequences of an answer; returns extra score awarded
    fn rig_after_answer(&mut self, correct: bool) -> u64 {
        let mult = self.config.score_multiplier;
        match &mut self.rig {
            Rig::Snake(snake) => {
                if correct {
                    snake.grow += 1;
                }
                0
            }
            Rig::Duel(duel) => {
                let action = duel.pending.take();
                let mut extra = 0;
                if let (true, Some(action)) = (correct, action) {
                    if let ActionOutcome::Healed(hp) = duel.land(action, &mut self.rng) {
                        self.run.lives = (self.run.lives + hp).min(self.run.max_lives);
                    }
                }
                if duel.monster_defeated() {
                    extra = (VICTORY_BONUS * mult).round() as u64;
                    duel.advance_level();
                    log::debug!("monster defeated, level {}", duel.level);
                    self.run.max_lives += HP_PER_LEVEL;
                    self.run.lives = self.run.max_lives;
                } else {
                    let damage = duel.enemy_turn(&mut self.rng);
                    self.run.lose_lives(damage);
                }
                self.run.add_score(extra);
                let lives = self.run.lives;
                self.emit(SessionEvent::LivesChanged { lives });
                extra
            }
            Rig::Dungeon(dungeon) => {
                dungeon.descend(&mut self.rng);
                if self.run.lives > 0 {
                    self.stage_floor();
                }
                0
            }
            Rig::Board(_) | Rig::None => 0,
        }
    }

    fn steer(&mut self, dir: Direction) -> Resolution {
        let mult = self.config.score_multiplier;
        match &mut self.rig {
            Rig::Snake(snake) => {
                if snake.steer(dir) {
                    Resolution::Applied
                } else {
                    Resolution::Ignored
                }
            }
            Rig::Board(board) => match board.slide(dir) {
                Some(merged) => {
                    board.spawn_tile(&mut self.rng);
                    self.run.add_score((merged as f32 * mult).round() as u64);
                    Resolution::Applied
                }
                None => Resolution::Ignored,
            },
            _ => Resolution::Ignored,
        }
    }

    fn open_action(&mut self, action: DuelAction) -> Resolution {
        match &mut self.rig {
            Rig::Duel(duel) if duel.can_use(action) => duel.pending = Some(action),
            _ => return Resolution::Ignored,
        }
        if self.spawn_wave() {
            Resolution::Applied
        } else {
            if let Rig::Duel(duel) = &mut self.rig {
                duel.pending = None;
            }
            Resolution::Ignored
        }
    }

    /// Immediate respawn for single-target games once the wave is gone
    fn refill(&mut self) {
        if self.rules.spawn.precondition == SpawnPrecondition::NoneAlive
            && !self.any_alive()
            && self.spawn_wave()
        {
            self.run.spawn_timer_ms = 0.0;
        }
    }
}
