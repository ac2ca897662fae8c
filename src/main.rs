//! Base Arcade entry point
//!
//! The browser build starts from `web::init`; natively this runs one headless
//! demo session with the autopilot and prints the final summary as JSON.
//!
//! Usage: `base-arcade [game | quiz:<mode>] [base] [difficulty] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::error::Error;
    use std::path::Path;
    use std::rc::Rc;

    use base_arcade::consts::FRAME_MS;
    use base_arcade::driver::{FrameScheduler, LoopDriver};
    use base_arcade::quiz::{QuizMode, QuizSession};
    use base_arcade::sim::{Autopilot, FinalSummary};
    use base_arcade::{GameKind, HighScores, NumeralBase, RandomSource, Settings};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const SETTINGS_FILE: &str = "base-arcade.json";
    const SCORES_FILE: &str = "base-arcade-scores.json";

    /// Longest demo run before giving up
    const MAX_DEMO_MS: f64 = 30.0 * 60.0 * 1000.0;

    enum Target {
        Game(GameKind),
        Quiz(QuizMode),
    }

    /// Frames are delivered immediately by the demo loop
    #[derive(Default)]
    struct ImmediateScheduler {
        next: u64,
    }

    impl FrameScheduler for ImmediateScheduler {
        type Handle = u64;

        fn schedule(&mut self) -> Option<u64> {
            self.next += 1;
            Some(self.next)
        }

        fn cancel(&mut self, _handle: u64) {}
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let mut settings = Settings::load_from(Path::new(SETTINGS_FILE))?;
        let args: Vec<String> = std::env::args().skip(1).collect();

        let target = match args.first() {
            Some(arg) => match arg.strip_prefix("quiz:") {
                Some(mode) => Target::Quiz(mode.parse()?),
                None => {
                    settings.game = arg.parse()?;
                    Target::Game(settings.game)
                }
            },
            None => Target::Game(settings.game),
        };
        if let Some(base) = args.get(1) {
            settings.base = NumeralBase::from_radix(base.parse()?)?;
        }
        if let Some(difficulty) = args.get(2) {
            settings.difficulty = difficulty.parse()?;
        }
        if let Some(seed) = args.get(3) {
            settings.seed = Some(seed.parse()?);
        }
        let seed = settings.resolve_seed();
        log::info!("seed {seed}");

        let scores = Rc::new(RefCell::new(HighScores::load_from(Path::new(SCORES_FILE))?));
        let summary = match target {
            Target::Game(kind) => play_game(kind, &settings, seed, &scores)?,
            Target::Quiz(mode) => take_quiz(mode, &settings, seed, &scores)?,
        };

        match summary {
            Some(summary) => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                if scores.borrow().top_score(&summary.mode) == Some(summary.score) {
                    log::info!("new best for '{}'", summary.mode);
                }
                scores.borrow().save_to(Path::new(SCORES_FILE))?;
            }
            None => log::warn!("demo ended without a summary"),
        }
        Ok(())
    }

    fn play_game(
        kind: GameKind,
        settings: &Settings,
        seed: u64,
        scores: &Rc<RefCell<HighScores>>,
    ) -> Result<Option<FinalSummary>, Box<dyn Error>> {
        log::info!("{} ({}, {})", kind.title(), settings.base, settings.difficulty);
        let mut session = kind.session(settings.base, settings.difficulty, seed)?;
        session.set_sink(Box::new(scores.clone()));

        let mut pilot = Autopilot::new(settings.autopilot_accuracy, settings.autopilot_reaction_ms);
        let mut rng = Pcg32::seed_from_u64(seed.rotate_left(17));
        let mut driver = LoopDriver::new(session, ImmediateScheduler::default());
        driver.start();

        let mut now = 0.0;
        while driver.pending().is_some() {
            if now > MAX_DEMO_MS {
                log::warn!("demo still running after {} s, quitting", MAX_DEMO_MS / 1000.0);
                driver.quit();
                break;
            }
            let snapshot = driver.session().snapshot();
            if let Some(input) = pilot.update(&snapshot, FRAME_MS, &mut rng) {
                driver.submit(input);
            }
            now += FRAME_MS as f64;
            driver.on_frame(now);
        }

        Ok(driver.session().summary().cloned())
    }

    fn take_quiz(
        mode: QuizMode,
        settings: &Settings,
        seed: u64,
        scores: &Rc<RefCell<HighScores>>,
    ) -> Result<Option<FinalSummary>, Box<dyn Error>> {
        log::info!("{mode} quiz ({}, {})", settings.base, settings.difficulty);
        let mut quiz = QuizSession::seeded(mode, settings.base, settings.difficulty, seed)?;
        quiz.set_sink(Box::new(scores.clone()));
        let mut rng = Pcg32::seed_from_u64(seed.rotate_left(17));
        quiz.start();

        while let Some(prompt) = quiz.prompt() {
            let wants_correct = rng.chance(settings.autopilot_accuracy);
            let choice = prompt.options.iter().position(|o| o.is_correct == wants_correct);
            let number = prompt.number;
            quiz.tick(settings.autopilot_reaction_ms);
            // The timer may have moved on to the next question
            if quiz.prompt().map(|p| p.number) != Some(number) {
                continue;
            }
            if let Some(index) = choice {
                quiz.choose(index);
            }
        }

        for (i, record) in quiz.history().iter().enumerate() {
            log::info!(
                "{:>2}. {} -> {} ({})",
                i + 1,
                record.question.display(),
                record.submitted.as_deref().unwrap_or("no answer"),
                if record.correct { "correct" } else { "wrong" }
            );
        }
        Ok(quiz.summary().cloned())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Base Arcade (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::init, this is just to satisfy the compiler
}
