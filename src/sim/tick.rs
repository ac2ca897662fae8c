//! Tick: spawn -> advance -> boundary/terminal -> cleanup
//!
//! Entities born during a tick neither move nor hit boundaries until the
//! next one.

use glam::{IVec2, Vec2};

use super::entity::{AnswerPayload, Entity, EntityId, EntityState};
use super::rules::{BoundaryEffect, Layout, MovementRule, RigKind, SpawnPrecondition, SpawnShape};
use super::session::Session;
use super::snake::StepOutcome;
use super::state::{Phase, Rig, SessionEvent};
use crate::consts::FIELD_SIZE;
use crate::question;
use crate::rng::RandomSource;

/// Random placement attempts before scanning for a free cell
const CELL_ATTEMPTS: usize = 64;

/// Grid size used for cell layouts without a snake rig
const DEFAULT_GRID: i32 = 20;

impl<R: RandomSource> Session<R> {
    /// Advance the session by `dt_ms`
    pub fn tick(&mut self, dt_ms: f32) {
        if self.phase != Phase::Running || !dt_ms.is_finite() {
            return;
        }
        let dt = dt_ms.max(0.0);
        self.run.ticks += 1;
        self.run.elapsed_ms += dt;

        self.spawn_check(dt);
        self.advance(dt);

        self.apply_boundaries();
        self.check_terminal();
        if self.phase != Phase::Running {
            return;
        }

        self.cleanup();
    }

    fn spawn_check(&mut self, dt: f32) {
        let spawn = &self.rules.spawn;
        if spawn.precondition == SpawnPrecondition::Manual {
            return;
        }
        let interval = self.config.scaled_interval(spawn.interval_ms);
        let precondition = spawn.precondition;

        self.run.spawn_timer_ms += dt;
        if self.run.spawn_timer_ms < interval {
            return;
        }
        let ready = match precondition {
            SpawnPrecondition::Always => true,
            SpawnPrecondition::NoneAlive => !self.any_alive(),
            SpawnPrecondition::Manual => false,
        };
        if ready && self.spawn_wave() {
            self.run.spawn_timer_ms = 0.0;
        }
    }

    /// Spawn one wave from a fresh question; false when there was no room
    pub(super) fn spawn_wave(&mut self) -> bool {
        let question = match question::generate(self.base, &self.config, &mut self.rng) {
            Ok(q) => q,
            Err(e) => {
                log::error!("question generation failed: {e}");
                return false;
            }
        };

        let wave = self.run.wave;
        let born = self.run.ticks;
        let shape = self.rules.spawn.shape.clone();

        let placed: Vec<(Vec2, AnswerPayload, Option<usize>)> = match shape {
            SpawnShape::Single { x, y } => {
                let pos = Vec2::new(self.rng.float_in(x.0, x.1), y);
                vec![(pos, AnswerPayload::Question(question), None)]
            }
            SpawnShape::Lanes { ys, x, busy_x } => {
                let free: Vec<usize> = (0..ys.len())
                    .filter(|&lane| {
                        !self
                            .entities
                            .iter()
                            .any(|e| e.is_alive() && e.lane == Some(lane) && e.pos.x > busy_x)
                    })
                    .collect();
                if free.is_empty() {
                    return false;
                }
                let lane = free[self.rng.index(free.len())];
                vec![(Vec2::new(x, ys[lane]), AnswerPayload::Question(question), Some(lane))]
            }
            SpawnShape::Choices { count, layout, spread } => {
                let n = count.for_wave(wave);
                let spread = spread.unwrap_or(self.config.distractor_spread);
                let mut options = question::answer_options(&question, n, spread, &mut self.rng);
                let positions = self.layout_positions(layout, options.len());
                if positions.is_empty() {
                    return false;
                }
                if positions.len() < options.len() {
                    log::debug!("wave {wave}: room for {} of {} options", positions.len(), n);
                    // The correct option always gets a place
                    options.sort_by_key(|o| !o.is_correct);
                    options.truncate(positions.len());
                }
                options
                    .into_iter()
                    .zip(positions)
                    .map(|(opt, pos)| {
                        (
                            pos,
                            AnswerPayload::Option {
                                label: opt.label,
                                is_correct: opt.is_correct,
                            },
                            None,
                        )
                    })
                    .collect()
            }
        };

        let ttl = self
            .rules
            .spawn
            .lifetime_ms
            .map(|ms| self.config.scaled_interval(ms));
        let jitter = match self.rules.movement {
            MovementRule::Linear { jitter, .. } => jitter,
            MovementRule::Static => None,
        };

        let count = placed.len();
        for (pos, payload, lane) in placed {
            let id = self.alloc_id();
            let mut entity = Entity::new(id, pos, payload, wave, born);
            entity.lane = lane;
            entity.ttl_ms = ttl;
            if let Some((lo, hi)) = jitter {
                entity.speed = self.rng.float_in(lo, hi);
            }
            self.entities.push(entity);
        }

        self.run.wave += 1;
        self.run.spawns += count as u32;
        log::trace!("wave {wave}: {count} entities");
        self.emit(SessionEvent::Spawned { wave, count });
        count > 0
    }

    fn layout_positions(&mut self, layout: Layout, n: usize) -> Vec<Vec2> {
        match layout {
            Layout::Slots { y } => (0..n)
                .map(|i| Vec2::new(FIELD_SIZE * (i + 1) as f32 / (n + 1) as f32, y))
                .collect(),
            Layout::Scatter { x, y } => (0..n)
                .map(|_| {
                    let px = self.rng.float_in(x.0, x.1);
                    let py = self.rng.float_in(y.0, y.1);
                    Vec2::new(px, py)
                })
                .collect(),
            Layout::Cells => {
                let grid = match self.rules.rig {
                    RigKind::Snake { grid, .. } => grid,
                    _ => DEFAULT_GRID,
                };
                let mut taken: Vec<IVec2> = self
                    .entities
                    .iter()
                    .filter(|e| e.is_alive())
                    .map(Entity::cell)
                    .collect();
                if let Rig::Snake(snake) = &self.rig {
                    taken.extend(snake.body.iter().copied());
                    // Keep the cell right in front of the head clear
                    taken.push(snake.head() + snake.heading.delta());
                }

                let mut cells = Vec::with_capacity(n);
                for _ in 0..n {
                    match self.free_cell(grid, &taken) {
                        Some(cell) => {
                            taken.push(cell);
                            cells.push(cell.as_vec2());
                        }
                        None => break,
                    }
                }
                cells
            }
        }
    }

    fn free_cell(&mut self, grid: i32, taken: &[IVec2]) -> Option<IVec2> {
        let last = (grid - 1).max(0) as u64;
        for _ in 0..CELL_ATTEMPTS {
            let cell = IVec2::new(self.rng.int_in(0, last) as i32, self.rng.int_in(0, last) as i32);
            if !taken.contains(&cell) {
                return Some(cell);
            }
        }
        (0..grid)
            .flat_map(|y| (0..grid).map(move |x| IVec2::new(x, y)))
            .find(|cell| !taken.contains(cell))
    }

    fn advance(&mut self, dt: f32) {
        let born = self.run.ticks;
        let dt_s = dt / 1000.0;
        let velocity = match self.rules.movement {
            MovementRule::Linear { velocity, .. } => velocity * self.config.speed_multiplier,
            MovementRule::Static => Vec2::ZERO,
        };

        if let Some(ms) = self.run.countdown_ms {
            self.run.countdown_ms = Some((ms - dt).max(0.0));
        }

        for e in self.entities.iter_mut() {
            match &mut e.state {
                EntityState::Alive if e.born_tick != born => {
                    e.age_ms += dt;
                    e.pos += velocity * e.speed * dt_s;
                }
                EntityState::Resolving { elapsed_ms } => *elapsed_ms += dt,
                _ => {}
            }
        }

        let timed_out: Vec<(EntityId, u32)> = self
            .entities
            .iter()
            .filter(|e| e.is_alive() && e.ttl_ms.is_some_and(|ttl| e.age_ms >= ttl))
            .map(|e| (e.id, e.wave))
            .collect();
        self.expire_penalized(&timed_out);

        match self.rules.rig {
            RigKind::Snake { step_ms, .. } => self.step_snake(dt, step_ms),
            RigKind::Dungeon => self.rest_on_floor(dt),
            _ => {}
        }
    }

    /// Expire entities and charge the expire penalty once per wave
    fn expire_penalized(&mut self, hits: &[(EntityId, u32)]) {
        let mut charged: Vec<u32> = Vec::new();
        for &(id, wave) in hits {
            let Some(e) = self.entity_mut(id) else { continue };
            if !e.is_alive() {
                continue;
            }
            e.state = EntityState::Expired;
            self.run.counters.expired += 1;
            if !charged.contains(&wave) {
                charged.push(wave);
                self.run.break_combo();
                let penalty = self.rules.penalties.expire;
                self.apply_penalty(penalty, Some(wave));
            }
        }
    }

    fn step_snake(&mut self, dt: f32, step_ms: f32) {
        let step = self.config.scaled_interval(step_ms);
        if let Rig::Snake(snake) = &mut self.rig {
            snake.step_acc_ms += dt;
        }

        loop {
            let outcome = match &mut self.rig {
                Rig::Snake(snake) if snake.step_acc_ms >= step => {
                    snake.step_acc_ms -= step;
                    snake.step()
                }
                _ => return,
            };
            match outcome {
                StepOutcome::Crashed => {
                    log::debug!("snake crashed");
                    self.run.breached = true;
                    return;
                }
                StepOutcome::Moved(cell) => {
                    let food = self
                        .entities
                        .iter()
                        .find(|e| e.is_alive() && e.cell() == cell)
                        .map(|e| e.id);
                    if let Some(id) = food {
                        self.resolve_pick(id);
                        if self.run.lives == 0 {
                            return;
                        }
                    }
                }
            }
        }
    }

    fn rest_on_floor(&mut self, dt: f32) {
        let rested = match &mut self.rig {
            Rig::Dungeon(dungeon) => dungeon.rest(dt),
            _ => false,
        };
        if !rested {
            return;
        }
        let bonus = match &self.rig {
            Rig::Dungeon(dungeon) => dungeon.event.bonus(),
            _ => 0.0,
        };
        let award = (bonus * self.config.score_multiplier).round() as u64;
        self.run.add_score(award);
        if let Rig::Dungeon(dungeon) = &mut self.rig {
            dungeon.descend(&mut self.rng);
        }
        self.stage_floor();
    }

    fn apply_boundaries(&mut self) {
        let Some(rule) = self.rules.boundary else { return };
        let born = self.run.ticks;
        let crossed: Vec<(EntityId, u32)> = self
            .entities
            .iter()
            .filter(|e| e.is_alive() && e.born_tick != born && rule.crossed(e.pos))
            .map(|e| (e.id, e.wave))
            .collect();
        if crossed.is_empty() {
            return;
        }

        match rule.effect {
            BoundaryEffect::Breach => {
                log::debug!("entity {} reached the danger zone", crossed[0].0);
                self.run.breached = true;
            }
            BoundaryEffect::Penalize => self.expire_penalized(&crossed),
            BoundaryEffect::Expire => {
                for (id, _) in crossed {
                    if let Some(e) = self.entity_mut(id) {
                        e.state = EntityState::Expired;
                    }
                    self.run.counters.expired += 1;
                }
            }
        }
    }

    fn cleanup(&mut self) {
        let grace = self.rules.resolve_grace_ms;
        self.entities.retain(|e| match e.state {
            EntityState::Alive => true,
            EntityState::Resolving { elapsed_ms } => elapsed_ms < grace,
            EntityState::Expired => false,
        });
    }
}
