//! Replay record for a headless run.
//!
//! A [`Seed`] names the effect, the surface size, parameter overrides, the
//! PRNG seed and how many frames to simulate at what rate. The same `Seed`
//! always reproduces the same final frame.

use crate::error::EffectError;
use serde::{Deserialize, Serialize};

/// Frame rate assumed when a seed file does not specify one.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub effect: String,
    pub width: usize,
    pub height: usize,
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
    pub seed: u64,
    #[serde(default)]
    pub frames: usize,
    /// Simulated display refresh rate in Hz; drives the elapsed clock.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
}

impl Seed {
    /// A seed with no overrides, zero frames and the default frame rate.
    pub fn new(effect: &str, width: usize, height: usize, seed: u64) -> Self {
        Self {
            effect: effect.to_string(),
            width,
            height,
            params: empty_params(),
            seed,
            frames: 0,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }

    /// Rejects zero or overflowing dimensions and a non-positive frame rate.
    pub fn validate(&self) -> Result<(), EffectError> {
        validate_dimensions(self.width, self.height)?;
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(EffectError::ParamOutOfRange {
                name: "frame_rate".into(),
                reason: format!("must be a positive number, got {}", self.frame_rate),
            });
        }
        Ok(())
    }

    /// Elapsed seconds at the start of frame `index`.
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 / self.frame_rate
    }
}

/// Shared dimension check for seeds, surfaces and effect resizes.
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), EffectError> {
    if width == 0 || height == 0 {
        return Err(EffectError::InvalidDimensions);
    }
    width
        .checked_mul(height)
        .ok_or(EffectError::InvalidDimensions)?;
    Ok(())
}
