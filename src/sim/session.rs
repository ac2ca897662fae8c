//! Session: the explicit context owning one run
//!
//! `Idle -> Running -> Terminal`. Construction validates everything, so a
//! session that reaches `Running` never meets a configuration error.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::board::Board;
use super::dungeon::{Dungeon, FloorEvent};
use super::duel::Duel;
use super::entity::{Entity, EntityId, EntityState};
use super::rules::{GameRules, Penalty, RigKind, StatKey};
use super::snake::Snake;
use super::state::{FinalSummary, Phase, Rig, RunState, SessionEvent, Snapshot, StatValue, TerminalReason};
use crate::difficulty::{Difficulty, DifficultyConfig};
use crate::error::ConfigError;
use crate::highscores::ScoreSink;
use crate::numeral::NumeralBase;
use crate::rng::RandomSource;

/// Everything needed to build a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSetup {
    /// Mode slug reported in the final summary
    pub mode: String,
    pub base: NumeralBase,
    pub difficulty: Difficulty,
    /// Numeric snapshot; usually `difficulty.config()`
    pub config: DifficultyConfig,
    pub rules: GameRules,
}

type Observer = Box<dyn FnMut(&SessionEvent)>;

/// One mini-game run
pub struct Session<R: RandomSource = Pcg32> {
    pub(super) mode: String,
    pub(super) base: NumeralBase,
    pub(super) difficulty: Difficulty,
    pub(super) config: DifficultyConfig,
    pub(super) rules: GameRules,
    pub(super) rng: R,
    pub(super) phase: Phase,
    pub(super) run: RunState,
    /// Sorted by id
    pub(super) entities: Vec<Entity>,
    pub(super) rig: Rig,
    next_id: EntityId,
    observers: Vec<Observer>,
    sink: Option<Box<dyn ScoreSink>>,
    summary: Option<FinalSummary>,
}

impl Session<Pcg32> {
    /// Session driven by a seeded PCG stream
    pub fn seeded(setup: SessionSetup, seed: u64) -> Result<Self, ConfigError> {
        Self::new(setup, Pcg32::seed_from_u64(seed))
    }
}

impl<R: RandomSource> Session<R> {
    pub fn new(setup: SessionSetup, rng: R) -> Result<Self, ConfigError> {
        setup.config.validate()?;
        setup.rules.validate()?;

        log::debug!(
            "session '{}' ready ({}, {})",
            setup.mode,
            setup.base,
            setup.difficulty
        );

        Ok(Self {
            mode: setup.mode,
            base: setup.base,
            difficulty: setup.difficulty,
            run: RunState::new(setup.rules.lives, None),
            config: setup.config,
            rules: setup.rules,
            rng,
            phase: Phase::Idle,
            entities: Vec::new(),
            rig: Rig::None,
            next_id: 1,
            observers: Vec::new(),
            sink: None,
            summary: None,
        })
    }

    /// Register an observer for session events
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Attach the collaborator that receives the final summary
    pub fn set_sink(&mut self, sink: Box<dyn ScoreSink>) {
        self.sink = Some(sink);
    }

    /// Reset the run and enter `Running`
    pub fn start(&mut self) {
        let countdown = self
            .rules
            .countdown
            .map(|c| self.config.scaled_interval(c.start_ms));
        self.run = RunState::new(self.rules.lives, countdown);
        self.entities.clear();
        self.summary = None;
        self.rig = match self.rules.rig {
            RigKind::None => Rig::None,
            RigKind::Snake { grid, .. } => Rig::Snake(Snake::new(grid)),
            RigKind::Board { size } => {
                let mut board = Board::new(size);
                board.spawn_tile(&mut self.rng);
                board.spawn_tile(&mut self.rng);
                Rig::Board(board)
            }
            RigKind::Duel => Rig::Duel(Duel::new()),
            RigKind::Dungeon => Rig::Dungeon(Dungeon::new(&mut self.rng)),
        };
        self.phase = Phase::Running;

        log::info!("session '{}' started", self.mode);
        self.emit(SessionEvent::Started);

        if matches!(self.rig, Rig::Dungeon(_)) {
            self.stage_floor();
        } else if self.rules.spawn.on_start {
            self.spawn_wave();
        }
    }

    /// Abandon the run: `Terminal` without a reason, nothing handed to the sink
    pub fn quit(&mut self) {
        if self.phase == Phase::Running {
            log::info!("session '{}' quit at score {}", self.mode, self.run.score);
            self.phase = Phase::Terminal;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    pub fn base(&self) -> NumeralBase {
        self.base
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Final summary, once the run has ended on a terminal predicate
    pub fn summary(&self) -> Option<&FinalSummary> {
        self.summary.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode.clone(),
            phase: self.phase,
            base: self.base,
            matching: self.rules.matching,
            run: self.run.clone(),
            entities: self.entities.clone(),
            rig: self.rig.clone(),
        }
    }

    /// Auxiliary stats configured for this game
    pub fn aux_stats(&self) -> BTreeMap<String, StatValue> {
        let mut stats = BTreeMap::new();
        for key in &self.rules.stats {
            let value = match (key, &self.rig) {
                (StatKey::Solved | StatKey::Destroyed | StatKey::WiresCut, _) => {
                    StatValue::from(self.run.counters.correct)
                }
                (StatKey::Wave, _) => StatValue::from(self.run.wave),
                (StatKey::BestCombo | StatKey::BestStreak, _) => StatValue::from(self.run.best_combo),
                (StatKey::Length, Rig::Snake(snake)) => StatValue::Int(snake.len() as i64),
                (StatKey::MaxTile, Rig::Board(board)) => StatValue::Text(self.base.format(board.max_tile())),
                (StatKey::Moves, Rig::Board(board)) => StatValue::from(board.moves),
                (StatKey::Level, Rig::Duel(duel)) => StatValue::from(duel.level),
                (StatKey::Floor, Rig::Dungeon(dungeon)) => StatValue::from(dungeon.floor),
                _ => StatValue::Int(0),
            };
            stats.insert(key.as_str().to_string(), value);
        }
        stats
    }

    pub(super) fn emit(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    pub(super) fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(super) fn any_alive(&self) -> bool {
        self.entities.iter().any(Entity::is_alive)
    }

    pub(super) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Expire every alive entity of `wave`
    pub(super) fn expire_wave(&mut self, wave: u32) {
        for e in self.entities.iter_mut().filter(|e| e.wave == wave && e.is_alive()) {
            e.state = EntityState::Expired;
        }
    }

    pub(super) fn expire_all(&mut self) {
        for e in self.entities.iter_mut().filter(|e| e.is_alive()) {
            e.state = EntityState::Expired;
        }
    }

    /// Apply a configured penalty; `wave` scopes the wave clear
    pub(super) fn apply_penalty(&mut self, penalty: Penalty, wave: Option<u32>) {
        if penalty.lives > 0 {
            self.run.lose_lives(penalty.lives);
            let lives = self.run.lives;
            self.emit(SessionEvent::LivesChanged { lives });
        }
        if penalty.time_ms > 0.0 {
            self.run.cut_countdown(penalty.time_ms);
        }
        self.run.deduct_score(penalty.score);
        if penalty.clear_wave {
            match wave {
                Some(w) => self.expire_wave(w),
                None => self.expire_all(),
            }
        }
    }

    /// Spawn the dungeon floor's challenge, if the floor has one
    pub(super) fn stage_floor(&mut self) {
        let event = match &self.rig {
            Rig::Dungeon(d) => d.event,
            _ => return,
        };
        if event != FloorEvent::Safe {
            self.spawn_wave();
        }
    }

    /// Evaluate terminal predicates in priority order and latch the first hit
    pub(super) fn check_terminal(&mut self) {
        if self.phase != Phase::Running || self.run.terminal.is_some() {
            return;
        }

        let board_full = matches!(&self.rig, Rig::Board(board) if board.is_stuck());
        let reason = TerminalReason::PRIORITY.into_iter().find(|reason| match reason {
            TerminalReason::HealthDepleted => self.run.lives == 0,
            TerminalReason::TimeExpired => self.run.countdown_ms.is_some_and(|ms| ms <= 0.0),
            TerminalReason::BoardFull => board_full,
            TerminalReason::Breached => self.run.breached,
            TerminalReason::Completed => false,
        });

        if let Some(reason) = reason {
            self.run.terminal = Some(reason);
            self.phase = Phase::Terminal;
            log::info!(
                "session '{}' ended: {} (score {})",
                self.mode,
                reason.as_str(),
                self.run.score
            );
            self.emit(SessionEvent::Terminal(reason));
            self.finalize(reason);
        }
    }

    /// Build the summary and hand it off; runs at most once per run
    fn finalize(&mut self, reason: TerminalReason) {
        if self.summary.is_some() {
            return;
        }
        let summary = FinalSummary {
            mode: self.mode.clone(),
            score: self.run.score,
            base: self.base,
            difficulty: self.difficulty,
            reason,
            stats: self.aux_stats(),
        };
        self.summary = Some(summary.clone());
        self.emit(SessionEvent::Finalized(summary.clone()));

        if summary.score == 0 {
            log::debug!("zero score, nothing submitted");
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.submit(&summary) {
                log::warn!("score sink failed: {e}");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::error::SinkError;
    use crate::sim::resolve::{PlayerInput, Resolution};
    use crate::sim::rules::{
        ChoiceCount, Layout, MatchRule, MovementRule, Penalties, ScoringRule, SpawnPrecondition,
        SpawnRule, SpawnShape,
    };

    /// Sink counting submissions
    pub(crate) struct CountingSink(pub Rc<RefCell<Vec<FinalSummary>>>);

    impl ScoreSink for CountingSink {
        fn submit(&mut self, summary: &FinalSummary) -> Result<(), SinkError> {
            self.0.borrow_mut().push(summary.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl ScoreSink for FailingSink {
        fn submit(&mut self, _summary: &FinalSummary) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("offline".into()))
        }
    }

    pub(crate) fn pick_rules(lives: u32) -> GameRules {
        GameRules {
            lives,
            countdown: None,
            spawn: SpawnRule {
                interval_ms: 0.0,
                precondition: SpawnPrecondition::NoneAlive,
                shape: SpawnShape::Choices {
                    count: ChoiceCount::fixed(4),
                    layout: Layout::Slots { y: 50.0 },
                    spread: None,
                },
                on_start: true,
                lifetime_ms: None,
            },
            movement: MovementRule::Static,
            boundary: None,
            matching: MatchRule::Pick,
            scoring: ScoringRule {
                base_award: 10.0,
                combo_step: 0.5,
                combo_cap: 4,
                time_bonus_per_sec: 0.0,
            },
            penalties: Penalties {
                wrong: Penalty::lives(1),
                miss: Penalty::NONE,
                expire: Penalty::NONE,
            },
            resolve_grace_ms: 300.0,
            hit_radius: 8.0,
            rig: RigKind::None,
            stats: vec![StatKey::Solved],
        }
    }

    pub(crate) fn setup(rules: GameRules) -> SessionSetup {
        SessionSetup {
            mode: "test".into(),
            base: NumeralBase::Decimal,
            difficulty: Difficulty::Easy,
            config: Difficulty::Easy.config(),
            rules,
        }
    }

    fn alive_option(session: &Session, correct: bool) -> EntityId {
        session
            .entities()
            .iter()
            .find(|e| e.is_alive() && e.is_correct() == correct)
            .map(|e| e.id)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let mut s = setup(pick_rules(3));
        s.config.operators.clear();
        assert_eq!(
            Session::seeded(s, 1).err(),
            Some(ConfigError::EmptyOperatorSet)
        );

        let mut s = setup(pick_rules(3));
        s.rules.lives = 0;
        assert!(matches!(Session::seeded(s, 1), Err(ConfigError::InvalidRules(_))));
    }

    #[test]
    fn test_start_spawns_first_wave() {
        let mut session = Session::seeded(setup(pick_rules(3)), 7).unwrap();
        assert_eq!(session.phase(), Phase::Idle);
        session.start();
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.entities().len(), 4);
        assert_eq!(session.entities().iter().filter(|e| e.is_correct()).count(), 1);
        assert_eq!(session.run().wave, 1);
    }

    #[test]
    fn test_three_wrong_picks_deplete_health() {
        let mut session = Session::seeded(setup(pick_rules(3)), 42).unwrap();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        session.set_sink(Box::new(CountingSink(submitted.clone())));
        let terminals = Rc::new(RefCell::new(0));
        let seen = terminals.clone();
        session.subscribe(move |event| {
            if matches!(event, SessionEvent::Terminal(_)) {
                *seen.borrow_mut() += 1;
            }
        });
        session.start();

        // Score something first so the summary is handed off
        let id = alive_option(&session, true);
        assert!(matches!(session.submit(PlayerInput::Pick(id)), Resolution::Correct { .. }));

        for _ in 0..3 {
            let id = alive_option(&session, false);
            assert_eq!(session.submit(PlayerInput::Pick(id)), Resolution::Incorrect { id });
        }
        assert_eq!(session.phase(), Phase::Terminal);
        assert_eq!(session.run().terminal, Some(TerminalReason::HealthDepleted));
        let score = session.run().score;

        // A fourth pick in the same frame changes nothing
        let stale = session.entities().iter().map(|e| e.id).max().unwrap_or(0);
        assert_eq!(session.submit(PlayerInput::Pick(stale)), Resolution::Ignored);
        session.tick(16.0);
        assert_eq!(session.run().score, score);
        assert_eq!(session.run().lives, 0);
        assert_eq!(session.run().terminal, Some(TerminalReason::HealthDepleted));

        assert_eq!(submitted.borrow().len(), 1);
        assert_eq!(*terminals.borrow(), 1);
        let summary = &submitted.borrow()[0];
        assert_eq!(summary.reason, TerminalReason::HealthDepleted);
        assert_eq!(summary.stats.get("solved"), Some(&StatValue::Int(1)));
    }

    #[test]
    fn test_zero_score_is_not_submitted() {
        let mut session = Session::seeded(setup(pick_rules(1)), 3).unwrap();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        session.set_sink(Box::new(CountingSink(submitted.clone())));
        session.start();
        let id = alive_option(&session, false);
        session.submit(PlayerInput::Pick(id));
        assert_eq!(session.phase(), Phase::Terminal);
        assert!(session.summary().is_some());
        assert!(submitted.borrow().is_empty());
    }

    #[test]
    fn test_sink_failure_does_not_touch_state() {
        let mut session = Session::seeded(setup(pick_rules(1)), 5).unwrap();
        session.set_sink(Box::new(FailingSink));
        session.start();
        let id = alive_option(&session, true);
        session.submit(PlayerInput::Pick(id));
        let id = alive_option(&session, false);
        session.submit(PlayerInput::Pick(id));
        assert_eq!(session.run().terminal, Some(TerminalReason::HealthDepleted));
        assert_eq!(session.summary().map(|s| s.score), Some(session.run().score));
    }

    #[test]
    fn test_cadence_spawns_scale_with_speed() {
        let mut rules = pick_rules(3);
        rules.matching = MatchRule::Typed;
        rules.spawn = SpawnRule {
            interval_ms: 2000.0,
            precondition: SpawnPrecondition::Always,
            shape: SpawnShape::Single { x: (10.0, 90.0), y: 0.0 },
            on_start: false,
            lifetime_ms: None,
        };
        let mut s = setup(rules);
        s.config.speed_multiplier = 2.0;
        let mut session = Session::seeded(s, 9).unwrap();
        session.start();
        for _ in 0..25 {
            session.tick(100.0);
        }
        assert_eq!(session.run().spawns, 2);
        assert_eq!(session.entities().len(), 2);
    }

    #[test]
    fn test_quit_is_silent() {
        let mut session = Session::seeded(setup(pick_rules(3)), 2).unwrap();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        session.set_sink(Box::new(CountingSink(submitted.clone())));
        session.start();
        let id = alive_option(&session, true);
        session.submit(PlayerInput::Pick(id));
        session.quit();
        assert_eq!(session.phase(), Phase::Terminal);
        assert_eq!(session.run().terminal, None);
        assert!(session.summary().is_none());
        assert!(submitted.borrow().is_empty());
        assert_eq!(session.submit(PlayerInput::Tap(Vec2::ZERO)), Resolution::Ignored);
    }

    #[test]
    fn test_restart_resets_run_but_not_ids() {
        let mut session = Session::seeded(setup(pick_rules(3)), 4).unwrap();
        session.start();
        let first_ids: Vec<_> = session.entities().iter().map(|e| e.id).collect();
        let id = alive_option(&session, true);
        session.submit(PlayerInput::Pick(id));
        session.start();
        assert_eq!(session.run().score, 0);
        assert_eq!(session.run().counters.correct, 0);
        assert!(session.entities().iter().all(|e| !first_ids.contains(&e.id)));
    }
}
