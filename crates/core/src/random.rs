//! Seeded random stream shared by every stage of a run.

use std::f64::consts::TAU;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

/// One deterministic stream per pipeline run. Stages receive it through the
/// generation context; nothing else in the crate draws randomness.
#[derive(Clone, Debug)]
pub struct DungeonRng {
    inner: ChaCha8Rng,
}

impl DungeonRng {
    pub fn seeded(seed: u64) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1_u64 << 53) as f64)
    }

    /// Uniform in `[low, high]`.
    pub fn range_inclusive(&mut self, low: i32, high: i32) -> i32 {
        debug_assert!(low <= high);
        let span = (i64::from(high) - i64::from(low) + 1) as u64;
        (i64::from(low) + (self.next_u64() % span) as i64) as i32
    }

    /// Like [`Self::range_inclusive`], but collapses to `high` for empty or
    /// single-value ranges.
    pub fn range_or_high(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return high;
        }
        self.range_inclusive(low, high)
    }

    /// Uniform in `0..100`.
    pub fn percent(&mut self) -> i32 {
        self.range_inclusive(0, 99)
    }

    /// Uniform angle in `[0, 2π)`.
    pub fn angle(&mut self) -> f64 {
        self.next_unit() * TAU
    }

    pub fn chance_half(&mut self) -> bool {
        self.next_unit() >= 0.5
    }

    /// Standard normal sample via the Marsaglia polar method.
    pub fn standard_normal(&mut self) -> f64 {
        loop {
            let u = self.next_unit() * 2.0 - 1.0;
            let v = self.next_unit() * 2.0 - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                return u * (-2.0 * s.ln() / s).sqrt();
            }
        }
    }

    pub fn gaussian(&mut self, mean: f64, deviation: f64) -> f64 {
        deviation * self.standard_normal() + mean
    }
}
