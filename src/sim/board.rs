//! Sliding-merge board (2048 rig)

use serde::{Deserialize, Serialize};

use super::state::Direction;
use crate::numeral::NumeralBase;
use crate::rng::RandomSource;

/// Chance that a spawned tile is a 4 instead of a 2
pub const FOUR_TILE_CHANCE: f32 = 0.1;

/// Square board; `0` is an empty cell, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub size: usize,
    pub cells: Vec<u64>,
    pub moves: u32,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
            moves: 0,
        }
    }

    pub fn from_rows(rows: &[&[u64]]) -> Self {
        let size = rows.len();
        Self {
            size,
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
            moves: 0,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.size + col]
    }

    pub fn max_tile(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Cell indices of one line, ordered so that index 0 is the wall tiles slide toward
    fn line(&self, dir: Direction, i: usize) -> Vec<usize> {
        let n = self.size;
        (0..n)
            .map(|j| match dir {
                Direction::Left => i * n + j,
                Direction::Right => i * n + (n - 1 - j),
                Direction::Up => j * n + i,
                Direction::Down => (n - 1 - j) * n + i,
            })
            .collect()
    }

    /// Slide every line toward `dir`, merging equal neighbours once per move.
    ///
    /// Returns the sum of merged tile values, or `None` when nothing moved.
    pub fn slide(&mut self, dir: Direction) -> Option<u64> {
        let mut moved = false;
        let mut merged_total = 0;

        for i in 0..self.size {
            let idx = self.line(dir, i);
            let tiles: Vec<u64> = idx.iter().map(|&k| self.cells[k]).filter(|&v| v != 0).collect();

            let mut out = Vec::with_capacity(self.size);
            let mut t = 0;
            while t < tiles.len() {
                if t + 1 < tiles.len() && tiles[t] == tiles[t + 1] {
                    let v = tiles[t] * 2;
                    merged_total += v;
                    out.push(v);
                    t += 2;
                } else {
                    out.push(tiles[t]);
                    t += 1;
                }
            }
            out.resize(self.size, 0);

            for (k, v) in idx.into_iter().zip(out) {
                if self.cells[k] != v {
                    moved = true;
                    self.cells[k] = v;
                }
            }
        }

        if moved {
            self.moves += 1;
            Some(merged_total)
        } else {
            None
        }
    }

    /// Place a 2 (or occasionally a 4) on a random empty cell
    pub fn spawn_tile<R: RandomSource>(&mut self, rng: &mut R) -> bool {
        let empty: Vec<usize> = (0..self.cells.len()).filter(|&k| self.cells[k] == 0).collect();
        if empty.is_empty() {
            return false;
        }
        let k = empty[rng.index(empty.len())];
        self.cells[k] = if rng.chance(FOUR_TILE_CHANCE) { 4 } else { 2 };
        true
    }

    /// Full with no adjacent equal pair
    pub fn is_stuck(&self) -> bool {
        let n = self.size;
        if self.cells.contains(&0) {
            return false;
        }
        for r in 0..n {
            for c in 0..n {
                let v = self.get(r, c);
                if c + 1 < n && self.get(r, c + 1) == v {
                    return false;
                }
                if r + 1 < n && self.get(r + 1, c) == v {
                    return false;
                }
            }
        }
        true
    }

    /// Tile labels in `base`, empty cells as empty strings
    pub fn labels(&self, base: NumeralBase) -> Vec<String> {
        self.cells
            .iter()
            .map(|&v| if v == 0 { String::new() } else { base.format(v) })
            .collect()
    }
}
