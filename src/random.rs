//! Injectable sources of pseudo-randomness
//!
//! Stages never touch a global RNG. They receive a [`RandomSource`], which is
//! a seeded ChaCha stream in production and a scripted sequence in tests.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of the random draws a stage needs
pub trait RandomSource {
    /// Draw a value uniformly from `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Permute `indices` in place
    fn shuffle(&mut self, indices: &mut [usize]);
}

/// Reproducible source backed by ChaCha8 seeded from a `u64`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn shuffle(&mut self, indices: &mut [usize]) {
        indices.shuffle(&mut self.rng);
    }
}

/// Deterministic source replaying fixed unit draws and an optional permutation
///
/// Unit values are mapped onto the requested range and cycle when exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    units: Vec<f64>,
    cursor: usize,
    order: Option<Vec<usize>>,
}

impl ScriptedRandom {
    /// Replay `units` (each in `[0, 1)`) for uniform draws
    pub fn new(units: Vec<f64>) -> Self {
        Self {
            units,
            cursor: 0,
            order: None,
        }
    }

    /// Always draw the same unit value
    pub fn constant(unit: f64) -> Self {
        Self::new(vec![unit])
    }

    /// Reorder shuffled slices by `order` (positions into the input slice)
    pub fn with_order(mut self, order: Vec<usize>) -> Self {
        self.order = Some(order);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if self.units.is_empty() {
            return low;
        }
        let unit = self.units[self.cursor % self.units.len()];
        self.cursor += 1;
        low + (high - low) * unit
    }

    fn shuffle(&mut self, indices: &mut [usize]) {
        // Identity unless a permutation of matching length was scripted
        if let Some(order) = &self.order {
            if order.len() == indices.len() {
                let original = indices.to_vec();
                for (slot, &from) in indices.iter_mut().zip(order.iter()) {
                    *slot = original[from];
                }
            }
        }
    }
}
