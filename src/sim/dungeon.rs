//! Dungeon floor rig

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

/// Safe floors advance on their own after this long
pub const SAFE_FLOOR_MS: f32 = 1500.0;

/// Every n-th floor may hold a boss
pub const BOSS_EVERY: u32 = 5;

/// What waits on a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorEvent {
    Monster,
    Chest,
    Trap,
    Boss,
    Safe,
}

impl FloorEvent {
    /// Points for clearing the floor, before the multiplier
    pub fn bonus(&self) -> f32 {
        match self {
            FloorEvent::Monster => 20.0,
            FloorEvent::Chest => 50.0,
            FloorEvent::Trap => 30.0,
            FloorEvent::Boss => 100.0,
            FloorEvent::Safe => 5.0,
        }
    }

    /// Roll the event for `floor`
    pub fn roll<R: RandomSource>(floor: u32, rng: &mut R) -> Self {
        if floor % BOSS_EVERY == 0 {
            return if rng.chance(0.7) {
                FloorEvent::Boss
            } else {
                FloorEvent::Safe
            };
        }
        if rng.chance(0.7) {
            [FloorEvent::Monster, FloorEvent::Chest, FloorEvent::Trap][rng.index(3)]
        } else {
            FloorEvent::Safe
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub floor: u32,
    pub event: FloorEvent,
    /// Time spent on a safe floor
    pub safe_ms: f32,
}

impl Dungeon {
    pub fn new<R: RandomSource>(rng: &mut R) -> Self {
        Self {
            floor: 1,
            event: FloorEvent::roll(1, rng),
            safe_ms: 0.0,
        }
    }

    /// Descend one floor and roll its event
    pub fn descend<R: RandomSource>(&mut self, rng: &mut R) {
        self.floor += 1;
        self.event = FloorEvent::roll(self.floor, rng);
        self.safe_ms = 0.0;
    }

    /// Accumulate time on a safe floor; true once it should auto-advance
    pub fn rest(&mut self, dt_ms: f32) -> bool {
        if self.event != FloorEvent::Safe {
            return false;
        }
        self.safe_ms += dt_ms;
        self.safe_ms >= SAFE_FLOOR_MS
    }
}
