//! Frame loop driver
//!
//! Owns the one recurring frame handle. Host frames feed a fixed-step
//! accumulator; the schedule is re-armed once per callback while the session
//! runs and is cancelled on terminal, pause, quit and drop.

use rand_pcg::Pcg32;

use crate::consts::{FRAME_MS, MAX_FRAME_MS, MAX_SUBSTEPS};
use crate::rng::RandomSource;
use crate::sim::{Phase, PlayerInput, Resolution, Session};

/// Host frame source (`requestAnimationFrame` in the browser)
pub trait FrameScheduler {
    type Handle: Copy + PartialEq + std::fmt::Debug;

    /// Request one frame callback; `None` if the host refused
    fn schedule(&mut self) -> Option<Self::Handle>;

    /// Cancel a pending request
    fn cancel(&mut self, handle: Self::Handle);
}

pub struct LoopDriver<S: FrameScheduler, R: RandomSource = Pcg32> {
    session: Session<R>,
    scheduler: S,
    pending: Option<S::Handle>,
    accumulator_ms: f32,
    last_time_ms: Option<f64>,
    paused: bool,
}

impl<S: FrameScheduler, R: RandomSource> LoopDriver<S, R> {
    pub fn new(session: Session<R>, scheduler: S) -> Self {
        Self {
            session,
            scheduler,
            pending: None,
            accumulator_ms: 0.0,
            last_time_ms: None,
            paused: false,
        }
    }

    /// Start (or restart) the session and arm the first frame
    pub fn start(&mut self) {
        self.disarm();
        self.session.start();
        self.accumulator_ms = 0.0;
        self.last_time_ms = None;
        self.paused = false;
        self.arm();
    }

    /// Frame callback; returns the number of fixed steps run
    pub fn on_frame(&mut self, now_ms: f64) -> u32 {
        // The handle that fired is spent
        self.pending = None;
        if self.paused || self.session.phase() != Phase::Running {
            return 0;
        }

        let dt = match self.last_time_ms {
            Some(last) => ((now_ms - last).max(0.0) as f32).min(MAX_FRAME_MS),
            None => FRAME_MS,
        };
        self.last_time_ms = Some(now_ms);
        self.accumulator_ms += dt;

        let mut substeps = 0;
        while self.accumulator_ms >= FRAME_MS && substeps < MAX_SUBSTEPS {
            self.session.tick(FRAME_MS);
            self.accumulator_ms -= FRAME_MS;
            substeps += 1;
            if !self.session.is_running() {
                break;
            }
        }

        if self.session.is_running() {
            self.arm();
        } else {
            log::debug!("session ended, frame loop stopped");
        }
        substeps
    }

    /// Forward an input to the session
    pub fn submit(&mut self, input: PlayerInput) -> Resolution {
        let resolution = self.session.submit(input);
        if !self.session.is_running() {
            self.disarm();
        }
        resolution
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.disarm();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Time spent paused is not simulated
            self.last_time_ms = None;
            if self.session.is_running() {
                self.arm();
            }
        }
    }

    /// Abandon the run and cancel the schedule
    pub fn quit(&mut self) {
        self.session.quit();
        self.disarm();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Outstanding frame request, if any
    pub fn pending(&self) -> Option<S::Handle> {
        self.pending
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn arm(&mut self) {
        if self.pending.is_none() {
            self.pending = self.scheduler.schedule();
        }
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<S: FrameScheduler, R: RandomSource> Drop for LoopDriver<S, R> {
    fn drop(&mut self) {
        self.disarm();
    }
}
