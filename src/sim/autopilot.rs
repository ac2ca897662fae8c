//! Demo-mode autopilot
//!
//! Plays any game from a `Snapshot`, the same view a render layer gets. It
//! answers with a configurable accuracy and a reaction delay so demo runs
//! eventually end.

use glam::IVec2;

use super::board::Board;
use super::duel::{DuelAction, SKILL_MP_COST};
use super::entity::Entity;
use super::resolve::PlayerInput;
use super::rules::MatchRule;
use super::snake::Snake;
use super::state::{Direction, Phase, Rig, Snapshot};
use crate::rng::RandomSource;

/// Simulated player
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Probability of answering correctly
    pub accuracy: f32,
    /// Delay between answers
    pub reaction_ms: f32,
    waited_ms: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(0.85, 600.0)
    }
}

impl Autopilot {
    pub fn new(accuracy: f32, reaction_ms: f32) -> Self {
        Self {
            accuracy: accuracy.clamp(0.0, 1.0),
            reaction_ms: reaction_ms.max(0.0),
            waited_ms: 0.0,
        }
    }

    /// Decide the next input after `dt_ms` has passed
    pub fn update<R: RandomSource>(
        &mut self,
        snapshot: &Snapshot,
        dt_ms: f32,
        rng: &mut R,
    ) -> Option<PlayerInput> {
        if snapshot.phase != Phase::Running {
            return None;
        }

        // Steering is continuous; answering waits out the reaction delay
        if let Rig::Snake(snake) = &snapshot.rig {
            return steer_snake(snake, &snapshot.entities).map(PlayerInput::Steer);
        }

        self.waited_ms += dt_ms;
        if self.waited_ms < self.reaction_ms {
            return None;
        }

        let input = match (&snapshot.rig, snapshot.matching) {
            (Rig::Board(board), _) => best_slide(board).map(PlayerInput::Steer),
            (Rig::Duel(duel), _) if !snapshot.entities.iter().any(Entity::is_alive) => {
                let action = if snapshot.run.lives * 3 < snapshot.run.max_lives && duel.potions > 0 {
                    DuelAction::Heal
                } else if duel.mp >= SKILL_MP_COST {
                    DuelAction::Skill
                } else {
                    DuelAction::Attack
                };
                Some(PlayerInput::Act(action))
            }
            (_, MatchRule::Typed | MatchRule::Duel) => self.type_answer(&snapshot.entities, rng),
            (_, MatchRule::Pick) => self.pick_option(&snapshot.entities, rng),
            _ => None,
        };

        if input.is_some() {
            self.waited_ms = 0.0;
        }
        input
    }

    /// Answer the oldest question on screen
    fn type_answer<R: RandomSource>(&self, entities: &[Entity], rng: &mut R) -> Option<PlayerInput> {
        let target = entities
            .iter()
            .filter(|e| e.is_alive())
            .max_by(|a, b| a.age_ms.total_cmp(&b.age_ms))?;
        let answer = target.answer()?;
        if rng.chance(self.accuracy) {
            Some(PlayerInput::Typed(answer))
        } else {
            Some(PlayerInput::Typed(format!("{answer}1")))
        }
    }

    fn pick_option<R: RandomSource>(&self, entities: &[Entity], rng: &mut R) -> Option<PlayerInput> {
        let alive: Vec<&Entity> = entities.iter().filter(|e| e.is_alive()).collect();
        let correct = alive.iter().find(|e| e.is_correct())?;
        let wrong: Vec<&&Entity> = alive.iter().filter(|e| !e.is_correct()).collect();
        if wrong.is_empty() || rng.chance(self.accuracy) {
            Some(PlayerInput::Pick(correct.id))
        } else {
            Some(PlayerInput::Pick(wrong[rng.index(wrong.len())].id))
        }
    }
}

/// Greedy move toward the correct food, avoiding walls, body and wrong food
fn steer_snake(snake: &Snake, entities: &[Entity]) -> Option<Direction> {
    let head = snake.head();
    let target = entities
        .iter()
        .find(|e| e.is_alive() && e.is_correct())
        .map(Entity::cell);
    let hazards: Vec<IVec2> = entities
        .iter()
        .filter(|e| e.is_alive() && !e.is_correct())
        .map(Entity::cell)
        .collect();
    let current = snake.queued.unwrap_or(snake.heading);

    let safe = |dir: Direction| {
        let next = head + dir.delta();
        let body = &snake.body[..snake.body.len().saturating_sub(1)];
        snake.in_bounds(next) && !body.contains(&next) && !hazards.contains(&next)
    };
    let distance = |dir: Direction| {
        let next = head + dir.delta();
        target.map(|t| (t - next).abs().element_sum()).unwrap_or(0)
    };

    let best = Direction::ALL
        .into_iter()
        .filter(|&d| d != snake.heading.opposite() && safe(d))
        // Prefer keeping the current course on ties
        .min_by_key(|&d| (distance(d), d != current))?;
    (best != current).then_some(best)
}

/// Slide that merges the most, in a fixed preference order on ties
fn best_slide(board: &Board) -> Option<Direction> {
    [Direction::Up, Direction::Left, Direction::Right, Direction::Down]
        .into_iter()
        .filter_map(|dir| {
            let mut trial = board.clone();
            trial.slide(dir).map(|merged| (dir, merged))
        })
        .fold(None, |best: Option<(Direction, u64)>, (dir, merged)| match best {
            Some((_, m)) if m >= merged => best,
            _ => Some((dir, merged)),
        })
        .map(|(dir, _)| dir)
}
