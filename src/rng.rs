//! Injectable random source
//!
//! The generator and the engine never reach for a global RNG. Sessions own a
//! seeded `Pcg32` by default; any `rand::Rng` works.

use rand::Rng;

/// The narrow randomness contract used by the generator and the engine
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]` (inclusive). `lo > hi` yields `lo`.
    fn int_in(&mut self, lo: u64, hi: u64) -> u64;

    /// Uniform float in `[0, 1)`
    fn unit(&mut self) -> f32;

    /// True with probability `p`
    fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform float in `[lo, hi)`
    fn float_in(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.unit()
    }

    /// Uniform index into a slice of length `len`; single-element slices draw nothing
    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.int_in(0, (len - 1) as u64) as usize
    }

    /// Random sign: +1 or -1
    fn sign(&mut self) -> i64 {
        if self.chance(0.5) { 1 } else { -1 }
    }

    /// Fisher-Yates shuffle
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.int_in(0, i as u64) as usize;
            items.swap(i, j);
        }
    }
}

impl<R: Rng> RandomSource for R {
    fn int_in(&mut self, lo: u64, hi: u64) -> u64 {
        if lo >= hi {
            return lo;
        }
        self.random_range(lo..=hi)
    }

    fn unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Test source that replays scripted integers (clamped into the requested range)
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    ints: std::collections::VecDeque<u64>,
    units: std::collections::VecDeque<f32>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(ints: &[u64]) -> Self {
        Self {
            ints: ints.iter().copied().collect(),
            units: Default::default(),
        }
    }

    pub(crate) fn with_units(mut self, units: &[f32]) -> Self {
        self.units = units.iter().copied().collect();
        self
    }
}

#[cfg(test)]
impl RandomSource for ScriptedSource {
    fn int_in(&mut self, lo: u64, hi: u64) -> u64 {
        match self.ints.pop_front() {
            Some(v) => v.clamp(lo, hi.max(lo)),
            None => lo,
        }
    }

    fn unit(&mut self) -> f32 {
        self.units.pop_front().unwrap_or(0.5)
    }
}
