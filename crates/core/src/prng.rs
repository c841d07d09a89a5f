//! Seedable Xorshift64 generator used for every random draw in backdrop.
//!
//! Particle spawns and recycles sample from this generator rather than a
//! global source, so a given seed always replays the same animation.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Xorshift64 PRNG with shifts (13, 7, 17).
///
/// A seed of 0 would lock the state at zero forever, so it is swapped for a
/// fixed non-zero fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a generator from `seed` (0 maps to the fallback seed).
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1), built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform angle in [0, 2π) radians.
    pub fn next_angle(&mut self) -> f64 {
        self.next_f64() * TAU
    }

    /// Uniform f64 in [-half_span, half_span).
    pub fn next_signed(&mut self, half_span: f64) -> f64 {
        self.next_range(-half_span, half_span)
    }
}
