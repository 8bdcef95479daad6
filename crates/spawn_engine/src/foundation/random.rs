//! Random number sources
//!
//! The scheduler never touches a global RNG. Everything that rolls dice gets a
//! `&mut dyn RandomSource`, so a run can be replayed from a seed and tests can
//! script exact outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed random numbers
pub trait RandomSource {
    /// Uniform float in `[lo, hi)`. Returns `lo` when the range is empty.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;

    /// Uniform integer in `[lo, hi)`. Returns `lo` when the range is empty.
    fn uniform_int(&mut self, lo: i32, hi: i32) -> i32;

    /// Roll with probability `p` of success
    fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.uniform(0.0, 1.0) < p
    }

    /// Uniform index into a collection of `len` elements
    fn index(&mut self, len: usize) -> usize {
        let upper = i32::try_from(len).unwrap_or(i32::MAX);
        usize::try_from(self.uniform_int(0, upper)).unwrap_or(0)
    }
}

/// `RandomSource` backed by rand's `StdRng`
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Deterministic source for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    fn uniform_int(&mut self, lo: i32, hi: i32) -> i32 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }
}

/// Replays a fixed list of unit fractions in `[0, 1)`, cycling when exhausted
///
/// Each call consumes one fraction `f` and maps it onto the requested range:
/// `uniform` returns `lo + f * (hi - lo)`, `uniform_int` returns
/// `lo + floor(f * (hi - lo))`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    fractions: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Create a scripted source. An empty script always yields `0.0`.
    pub fn new(fractions: impl Into<Vec<f64>>) -> Self {
        Self {
            fractions: fractions.into(),
            cursor: 0,
        }
    }

    fn next_fraction(&mut self) -> f64 {
        if self.fractions.is_empty() {
            return 0.0;
        }
        let value = self.fractions[self.cursor % self.fractions.len()];
        self.cursor += 1;
        value.clamp(0.0, 0.999_999)
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let fraction = self.next_fraction();
        if hi > lo {
            lo + fraction * (hi - lo)
        } else {
            lo
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn uniform_int(&mut self, lo: i32, hi: i32) -> i32 {
        let fraction = self.next_fraction();
        if hi > lo {
            let span = f64::from(hi) - f64::from(lo);
            lo + (fraction * span).floor() as i32
        } else {
            lo
        }
    }
}
