//! Deterministic seeded random number generator.
//!
//! Uses xorshift32 so cosmetic effects (particle bursts, drift timing,
//! random spawn cells) replay identically from the same seed.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Deterministic seeded random number generator using xorshift32.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Creates a new RNG with the given seed.
    /// Seed of 0 is treated as 1 to avoid the degenerate all-zero sequence.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Returns the next raw u32.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a random integer from 0 (inclusive) to max (exclusive).
    pub fn next_int(&mut self, max: u32) -> u32 {
        ((u64::from(self.next_u32()) * u64::from(max)) >> 32) as u32
    }

    /// Returns a random integer in `[min, max]`, both inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "empty range {min}..={max}");
        let span = (max - min + 1) as u64;
        let roll = (u64::from(self.next_u32()) * span) >> 32;
        min + roll as i64
    }

    /// Returns a fixed-point value in `[0, 1)`.
    pub fn next_fraction(&mut self) -> Fixed {
        // 32 fractional bits: the raw u32 is exactly a fraction of one.
        Fixed::from_bits(i64::from(self.next_u32()))
    }

    /// Returns a fixed-point value in `[min, max)`.
    pub fn fixed_range(&mut self, min: Fixed, max: Fixed) -> Fixed {
        min + (max - min) * self.next_fraction()
    }

    /// Returns a random element from a slice.
    pub fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            Some(&slice[self.next_int(slice.len() as u32) as usize])
        }
    }

    /// Returns the current internal state.
    #[must_use]
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(1)
    }
}
