//! Browser bindings
//!
//! `Arcade` wraps one session behind a `LoopDriver` scheduled with
//! `requestAnimationFrame`. The page renders from `snapshot()` and forwards
//! player input; final summaries go to the LocalStorage leaderboard.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::driver::{FrameScheduler, LoopDriver};
use crate::games::GameKind;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::sim::{Direction, DuelAction, PlayerInput, Resolution};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` with a single reusable callback
struct RafScheduler {
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl FrameScheduler for RafScheduler {
    type Handle = i32;

    fn schedule(&mut self) -> Option<i32> {
        let window = web_sys::window()?;
        let callback = self.callback.borrow();
        let callback = callback.as_ref()?;
        window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .ok()
    }

    fn cancel(&mut self, handle: i32) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle);
        }
    }
}

/// One arcade game bound to the page
#[wasm_bindgen]
pub struct Arcade {
    driver: Rc<RefCell<LoopDriver<RafScheduler>>>,
    scores: Rc<RefCell<HighScores>>,
}

#[wasm_bindgen]
impl Arcade {
    /// Build a session from the stored settings, overridden by the arguments
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, base: u32, difficulty: &str) -> Result<Arcade, JsError> {
        let mut settings = Settings::load();
        settings.game = game.parse()?;
        settings.base = crate::numeral::NumeralBase::from_radix(base)?;
        settings.difficulty = difficulty.parse()?;
        settings.save();

        let mut session = crate::sim::Session::seeded(settings.setup(), settings.resolve_seed())?;
        let scores = Rc::new(RefCell::new(HighScores::load()));
        session.set_sink(Box::new(scores.clone()));

        let callback = Rc::new(RefCell::new(None));
        let scheduler = RafScheduler {
            callback: callback.clone(),
        };
        let driver = Rc::new(RefCell::new(LoopDriver::new(session, scheduler)));

        let weak: Weak<RefCell<LoopDriver<RafScheduler>>> = Rc::downgrade(&driver);
        *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_frame(time);
            }
        }));

        log::info!("{} ready", settings.game.title());
        Ok(Arcade { driver, scores })
    }

    pub fn start(&self) {
        self.driver.borrow_mut().start();
    }

    pub fn pause(&self) {
        self.driver.borrow_mut().pause();
    }

    pub fn resume(&self) {
        self.driver.borrow_mut().resume();
    }

    pub fn quit(&self) {
        self.driver.borrow_mut().quit();
    }

    #[wasm_bindgen(getter)]
    pub fn paused(&self) -> bool {
        self.driver.borrow().is_paused()
    }

    /// Typed answer; returns the resolution as JSON
    pub fn type_answer(&self, text: &str) -> String {
        self.submit(PlayerInput::Typed(text.to_string()))
    }

    pub fn pick(&self, id: u32) -> String {
        self.submit(PlayerInput::Pick(id))
    }

    pub fn tap(&self, x: f32, y: f32) -> String {
        self.submit(PlayerInput::Tap(Vec2::new(x, y)))
    }

    /// `up | down | left | right`
    pub fn steer(&self, direction: &str) -> String {
        let dir = match direction.to_lowercase().as_str() {
            "up" => Direction::Up,
            "down" => Direction::Down,
            "left" => Direction::Left,
            "right" => Direction::Right,
            _ => return self.resolution_json(&Resolution::Ignored),
        };
        self.submit(PlayerInput::Steer(dir))
    }

    /// `attack | skill | heal`
    pub fn act(&self, action: &str) -> String {
        let action = match action.to_lowercase().as_str() {
            "attack" => DuelAction::Attack,
            "skill" => DuelAction::Skill,
            "heal" => DuelAction::Heal,
            _ => return self.resolution_json(&Resolution::Ignored),
        };
        self.submit(PlayerInput::Act(action))
    }

    /// Render-ready state as JSON
    pub fn snapshot(&self) -> String {
        let snapshot = self.driver.borrow().session().snapshot();
        serde_json::to_string(&snapshot).unwrap_or_default()
    }

    /// Final summary as JSON, once the run has ended
    pub fn summary(&self) -> Option<String> {
        let driver = self.driver.borrow();
        let summary = driver.session().summary()?;
        serde_json::to_string(summary).ok()
    }

    /// Leaderboard as JSON
    pub fn high_scores(&self) -> String {
        serde_json::to_string(&*self.scores.borrow()).unwrap_or_default()
    }
}

impl Arcade {
    fn submit(&self, input: PlayerInput) -> String {
        let resolution = self.driver.borrow_mut().submit(input);
        self.resolution_json(&resolution)
    }

    fn resolution_json(&self, resolution: &Resolution) -> String {
        serde_json::to_string(resolution).unwrap_or_default()
    }
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Base Arcade loaded");
}
