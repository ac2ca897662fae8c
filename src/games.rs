//! The ten mini-games as rule presets
//!
//! Field coordinates run 0..100 on both axes with y growing downward. Grid
//! games (snake) use cell coordinates instead.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::FIELD_SIZE;
use crate::difficulty::Difficulty;
use crate::error::ConfigError;
use crate::numeral::NumeralBase;
use crate::sim::{
    Axis, BoundaryEffect, BoundaryRule, ChoiceCount, Countdown, Crossing, GameRules, Layout,
    MatchRule, MovementRule, Penalties, Penalty, RigKind, ScoringRule, Session, SessionSetup,
    SpawnPrecondition, SpawnRule, SpawnShape, StatKey,
};

/// Mini-game selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    #[default]
    FallingNumbers,
    BaseDefense,
    SpaceShooter,
    TimeBomb,
    QuickMath,
    MemoryCard,
    MathSnake,
    #[serde(rename = "puzzle-2048")]
    Puzzle2048,
    MonsterSlayer,
    DungeonCrawler,
}

impl GameKind {
    pub const ALL: [GameKind; 10] = [
        GameKind::FallingNumbers,
        GameKind::BaseDefense,
        GameKind::SpaceShooter,
        GameKind::TimeBomb,
        GameKind::QuickMath,
        GameKind::MemoryCard,
        GameKind::MathSnake,
        GameKind::Puzzle2048,
        GameKind::MonsterSlayer,
        GameKind::DungeonCrawler,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            GameKind::FallingNumbers => "falling-numbers",
            GameKind::BaseDefense => "base-defense",
            GameKind::SpaceShooter => "space-shooter",
            GameKind::TimeBomb => "time-bomb",
            GameKind::QuickMath => "quick-math",
            GameKind::MemoryCard => "memory-card",
            GameKind::MathSnake => "math-snake",
            GameKind::Puzzle2048 => "puzzle-2048",
            GameKind::MonsterSlayer => "monster-slayer",
            GameKind::DungeonCrawler => "dungeon-crawler",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::FallingNumbers => "Falling Numbers",
            GameKind::BaseDefense => "Base Defense",
            GameKind::SpaceShooter => "Space Shooter",
            GameKind::TimeBomb => "Time Bomb",
            GameKind::QuickMath => "Quick Math",
            GameKind::MemoryCard => "Memory Cards",
            GameKind::MathSnake => "Math Snake",
            GameKind::Puzzle2048 => "2048",
            GameKind::MonsterSlayer => "Monster Slayer",
            GameKind::DungeonCrawler => "Dungeon Crawler",
        }
    }

    /// Rule preset; difficulty is applied by the session, not here
    pub fn rules(&self) -> GameRules {
        match self {
            GameKind::FallingNumbers => GameRules {
                boundary: Some(BoundaryRule {
                    axis: Axis::Y,
                    crossing: Crossing::AtLeast,
                    limit: FIELD_SIZE,
                    effect: BoundaryEffect::Breach,
                }),
                stats: vec![StatKey::Solved],
                ..typing(
                    SpawnRule {
                        interval_ms: 0.0,
                        precondition: SpawnPrecondition::NoneAlive,
                        shape: SpawnShape::Single { x: (15.0, 85.0), y: 0.0 },
                        on_start: true,
                        lifetime_ms: None,
                    },
                    // Top to bottom in 14 seconds
                    MovementRule::Linear {
                        velocity: Vec2::new(0.0, FIELD_SIZE / 14.0),
                        jitter: None,
                    },
                )
            },

            GameKind::BaseDefense => GameRules {
                boundary: Some(BoundaryRule {
                    axis: Axis::X,
                    crossing: Crossing::AtMost,
                    limit: 8.0,
                    effect: BoundaryEffect::Breach,
                }),
                stats: vec![StatKey::Destroyed],
                ..typing(
                    SpawnRule {
                        interval_ms: 3000.0,
                        precondition: SpawnPrecondition::Always,
                        shape: SpawnShape::Lanes {
                            ys: vec![15.0, 32.0, 50.0, 68.0, 85.0],
                            x: 110.0,
                            busy_x: 85.0,
                        },
                        on_start: true,
                        lifetime_ms: None,
                    },
                    MovementRule::Linear {
                        velocity: Vec2::new(-2.4, 0.0),
                        jitter: None,
                    },
                )
            },

            GameKind::SpaceShooter => GameRules {
                lives: 3,
                boundary: Some(BoundaryRule {
                    axis: Axis::Y,
                    crossing: Crossing::AtLeast,
                    limit: 80.0,
                    effect: BoundaryEffect::Penalize,
                }),
                penalties: Penalties {
                    wrong: Penalty::lives(1),
                    miss: Penalty::NONE,
                    expire: Penalty::lives(1),
                },
                hit_radius: 9.0,
                stats: vec![StatKey::Wave],
                ..choices(
                    SpawnRule {
                        interval_ms: 2000.0,
                        precondition: SpawnPrecondition::NoneAlive,
                        shape: SpawnShape::Choices {
                            count: ChoiceCount {
                                base: 3,
                                per_waves: 3,
                                max: 6,
                            },
                            layout: Layout::Scatter {
                                x: (15.0, 85.0),
                                y: (-60.0, -20.0),
                            },
                            spread: None,
                        },
                        on_start: true,
                        lifetime_ms: None,
                    },
                    MovementRule::Linear {
                        velocity: Vec2::new(0.0, 5.0),
                        jitter: Some((0.7, 1.3)),
                    },
                )
            },

            GameKind::TimeBomb => GameRules {
                countdown: Some(Countdown {
                    start_ms: 40_000.0,
                    max_ms: 99_000.0,
                    bonus_ms: 5_000.0,
                    streak_bonus_ms: 5_000.0,
                    streak_threshold: u32::MAX,
                }),
                scoring: ScoringRule::default(),
                penalties: Penalties {
                    wrong: Penalty::time(10_000.0),
                    ..Penalties::default()
                },
                stats: vec![StatKey::WiresCut],
                ..choices(panel(4, 60.0, Some(10)), MovementRule::Static)
            },

            GameKind::QuickMath => GameRules {
                countdown: Some(Countdown {
                    start_ms: 60_000.0,
                    max_ms: 60_000.0,
                    bonus_ms: 1_500.0,
                    streak_bonus_ms: 2_500.0,
                    streak_threshold: 3,
                }),
                scoring: ScoringRule {
                    base_award: 10.0,
                    combo_step: 1.0,
                    combo_cap: 5,
                    time_bonus_per_sec: 0.0,
                },
                penalties: Penalties {
                    wrong: Penalty::time(4_000.0),
                    ..Penalties::default()
                },
                stats: vec![StatKey::BestCombo],
                ..choices(panel(4, 70.0, None), MovementRule::Static)
            },

            GameKind::MemoryCard => GameRules {
                lives: 3,
                scoring: ScoringRule {
                    base_award: 10.0,
                    combo_step: 0.5,
                    combo_cap: 10,
                    time_bonus_per_sec: 2.0,
                },
                penalties: Penalties {
                    wrong: Penalty::NONE,
                    miss: Penalty::lives(1),
                    expire: Penalty::lives(1),
                },
                stats: vec![StatKey::BestStreak],
                ..typing(
                    SpawnRule {
                        interval_ms: 0.0,
                        precondition: SpawnPrecondition::NoneAlive,
                        shape: SpawnShape::Single { x: (50.0, 50.0), y: 50.0 },
                        on_start: true,
                        lifetime_ms: Some(15_000.0),
                    },
                    MovementRule::Static,
                )
            },

            GameKind::MathSnake => GameRules {
                matching: MatchRule::Steer,
                penalties: Penalties {
                    wrong: Penalty::lives(1),
                    ..Penalties::default()
                },
                rig: RigKind::Snake {
                    grid: 20,
                    step_ms: 100.0,
                },
                stats: vec![StatKey::Length],
                ..choices(
                    SpawnRule {
                        interval_ms: 0.0,
                        precondition: SpawnPrecondition::NoneAlive,
                        shape: SpawnShape::Choices {
                            count: ChoiceCount::fixed(3),
                            layout: Layout::Cells,
                            spread: Some(5),
                        },
                        on_start: true,
                        lifetime_ms: None,
                    },
                    MovementRule::Static,
                )
            },

            GameKind::Puzzle2048 => GameRules {
                matching: MatchRule::Steer,
                rig: RigKind::Board { size: 4 },
                stats: vec![StatKey::MaxTile, StatKey::Moves],
                ..typing(manual(SpawnShape::Single { x: (50.0, 50.0), y: 50.0 }), MovementRule::Static)
            },

            GameKind::MonsterSlayer => GameRules {
                lives: 100,
                matching: MatchRule::Duel,
                rig: RigKind::Duel,
                stats: vec![StatKey::Level],
                ..typing(manual(SpawnShape::Single { x: (50.0, 50.0), y: 40.0 }), MovementRule::Static)
            },

            GameKind::DungeonCrawler => GameRules {
                lives: 3,
                penalties: Penalties {
                    wrong: Penalty::lives(1),
                    ..Penalties::default()
                },
                rig: RigKind::Dungeon,
                stats: vec![StatKey::Floor],
                ..choices(
                    manual(SpawnShape::Choices {
                        count: ChoiceCount::fixed(2),
                        layout: Layout::Slots { y: 60.0 },
                        spread: Some(3),
                    }),
                    MovementRule::Static,
                )
            },
        }
    }

    /// Session setup for a base and difficulty selection
    pub fn setup(&self, base: NumeralBase, difficulty: Difficulty) -> SessionSetup {
        SessionSetup {
            mode: self.slug().to_string(),
            base,
            difficulty,
            config: difficulty.config(),
            rules: self.rules(),
        }
    }

    /// Seeded session for this game
    pub fn session(
        &self,
        base: NumeralBase,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<Session, ConfigError> {
        Session::seeded(self.setup(base, difficulty), seed)
    }
}

/// Single-life typing game skeleton
fn typing(spawn: SpawnRule, movement: MovementRule) -> GameRules {
    GameRules {
        lives: 1,
        countdown: None,
        spawn,
        movement,
        boundary: None,
        matching: MatchRule::Typed,
        scoring: ScoringRule {
            base_award: 10.0,
            combo_step: 0.1,
            combo_cap: 10,
            time_bonus_per_sec: 0.0,
        },
        penalties: Penalties::default(),
        resolve_grace_ms: 300.0,
        hit_radius: 8.0,
        rig: RigKind::None,
        stats: Vec::new(),
    }
}

/// Single-life multiple-choice skeleton
fn choices(spawn: SpawnRule, movement: MovementRule) -> GameRules {
    GameRules {
        matching: MatchRule::Pick,
        ..typing(spawn, movement)
    }
}

/// A fixed row of `n` options, respawned as soon as it is answered
fn panel(n: usize, y: f32, spread: Option<u64>) -> SpawnRule {
    SpawnRule {
        interval_ms: 0.0,
        precondition: SpawnPrecondition::NoneAlive,
        shape: SpawnShape::Choices {
            count: ChoiceCount::fixed(n),
            layout: Layout::Slots { y },
            spread,
        },
        on_start: true,
        lifetime_ms: None,
    }
}

fn manual(shape: SpawnShape) -> SpawnRule {
    SpawnRule {
        interval_ms: 0.0,
        precondition: SpawnPrecondition::Manual,
        shape,
        on_start: false,
        lifetime_ms: None,
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for GameKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        GameKind::ALL
            .into_iter()
            .find(|g| g.slug() == s || g.slug().replace('-', "_") == s)
            .ok_or(ConfigError::UnknownGame(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Autopilot, Phase, Rig, StatValue, TerminalReason};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const FRAME_MS: f32 = 1000.0 / 60.0;

    /// Play a game to the end with a hopeless autopilot
    fn play_out(kind: GameKind, seed: u64) -> crate::sim::FinalSummary {
        let mut session = kind
            .session(NumeralBase::Hex, Difficulty::Medium, seed)
            .unwrap();
        let mut pilot = Autopilot::new(0.0, 250.0);
        let mut rng = Pcg32::seed_from_u64(seed ^ 0xA5A5);
        session.start();

        // 30 simulated minutes
        for _ in 0..(30 * 60 * 60) {
            if session.phase() != Phase::Running {
                break;
            }
            if kind != GameKind::MathSnake {
                let snapshot = session.snapshot();
                if let Some(input) = pilot.update(&snapshot, FRAME_MS, &mut rng) {
                    session.submit(input);
                }
            }
            session.tick(FRAME_MS);
        }
        assert_eq!(session.phase(), Phase::Terminal, "{kind} never ended");
        session.summary().cloned().unwrap()
    }

    #[test]
    fn test_every_preset_validates() {
        for kind in GameKind::ALL {
            for difficulty in Difficulty::ALL {
                assert!(kind.session(NumeralBase::Binary, difficulty, 1).is_ok(), "{kind}");
            }
        }
    }

    #[test]
    fn test_slugs_parse() {
        for kind in GameKind::ALL {
            assert_eq!(kind.slug().parse::<GameKind>(), Ok(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.slug()));
        }
        assert_eq!("Math_Snake".parse::<GameKind>(), Ok(GameKind::MathSnake));
        assert!(matches!("pong".parse::<GameKind>(), Err(ConfigError::UnknownGame(_))));
    }

    #[test]
    fn test_every_game_reaches_terminal() {
        for kind in GameKind::ALL {
            let summary = play_out(kind, 21);
            assert_eq!(summary.mode, kind.slug());
            let mut expected: Vec<_> = kind.rules().stats.iter().map(|s| s.as_str().to_string()).collect();
            expected.sort();
            let keys: Vec<_> = summary.stats.keys().cloned().collect();
            assert_eq!(keys, expected, "{kind}");
        }
    }

    #[test]
    fn test_terminal_reasons_by_game() {
        assert_eq!(play_out(GameKind::FallingNumbers, 3).reason, TerminalReason::Breached);
        assert_eq!(play_out(GameKind::BaseDefense, 3).reason, TerminalReason::Breached);
        assert_eq!(play_out(GameKind::TimeBomb, 3).reason, TerminalReason::TimeExpired);
        assert_eq!(play_out(GameKind::QuickMath, 3).reason, TerminalReason::TimeExpired);
        assert_eq!(play_out(GameKind::MemoryCard, 3).reason, TerminalReason::HealthDepleted);
        assert_eq!(play_out(GameKind::SpaceShooter, 3).reason, TerminalReason::HealthDepleted);
        assert_eq!(play_out(GameKind::DungeonCrawler, 3).reason, TerminalReason::HealthDepleted);
        assert_eq!(play_out(GameKind::MonsterSlayer, 3).reason, TerminalReason::HealthDepleted);
        assert_eq!(play_out(GameKind::Puzzle2048, 3).reason, TerminalReason::BoardFull);
    }

    #[test]
    fn test_snake_crashes_into_wall() {
        let mut session = GameKind::MathSnake
            .session(NumeralBase::Decimal, Difficulty::Easy, 8)
            .unwrap();
        session.start();
        for _ in 0..200 {
            session.tick(100.0);
        }
        assert_eq!(session.phase(), Phase::Terminal);
        assert!(matches!(
            session.run().terminal,
            Some(TerminalReason::Breached | TerminalReason::HealthDepleted)
        ));
    }

    #[test]
    fn test_2048_board_and_max_tile_stat() {
        let mut session = GameKind::Puzzle2048
            .session(NumeralBase::Binary, Difficulty::Easy, 5)
            .unwrap();
        session.start();
        match session.rig() {
            Rig::Board(board) => assert_eq!(board.cells.iter().filter(|&&v| v != 0).count(), 2),
            other => panic!("unexpected rig {other:?}"),
        }
        let stats = session.aux_stats();
        assert!(matches!(stats.get("max_tile"), Some(StatValue::Text(t)) if t == "10" || t == "100"));
        assert_eq!(stats.get("moves"), Some(&StatValue::Int(0)));
    }

    #[test]
    fn test_shooter_waves_grow() {
        let rules = GameKind::SpaceShooter.rules();
        match rules.spawn.shape {
            SpawnShape::Choices { count, .. } => {
                assert_eq!(count.for_wave(0), 3);
                assert_eq!(count.for_wave(9), 6);
                assert_eq!(count.for_wave(30), 6);
            }
            _ => panic!("shooter spawns choices"),
        }
    }

    #[test]
    fn test_quick_math_bonus_capped_at_scaled_start() {
        let mut session = GameKind::QuickMath
            .session(NumeralBase::Decimal, Difficulty::Hard, 3)
            .unwrap();
        session.start();
        let start = session.run().countdown_ms;
        assert_eq!(start, Some(24_000.0));

        let mut picks = 0;
        while picks < 30 && session.phase() == Phase::Running {
            let id = session
                .entities()
                .iter()
                .find(|e| e.is_alive() && e.is_correct())
                .map(|e| e.id);
            match id {
                Some(id) => {
                    session.submit(crate::sim::PlayerInput::Pick(id));
                    picks += 1;
                }
                None => session.tick(FRAME_MS),
            }
            assert!(session.run().countdown_ms <= start);
        }
        assert_eq!(picks, 30);
    }
}
