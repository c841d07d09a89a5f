#![deny(unsafe_code)]
//! Core types and traits for the backdrop animated backgrounds.
//!
//! Provides the `Effect` trait, the `Surface` drawing trait with a CPU
//! `Raster` and a recording `DisplayList`, the cancelable frame loop
//! (`FrameScheduler`, `AnimationLoop`), color types, the `Xorshift64` PRNG,
//! the `Seed` replay record and JSON parameter helpers.

pub mod color;
pub mod effect;
pub mod error;
pub mod frame;
pub mod params;
pub mod prng;
pub mod raster;
pub mod seed;
pub mod surface;

pub use color::{LinearRgb, Rgba, Srgb};
pub use effect::Effect;
pub use error::EffectError;
pub use frame::{AnimationLoop, FrameHandle, FrameScheduler, ManualScheduler};
pub use prng::Xorshift64;
pub use raster::Raster;
pub use seed::Seed;
pub use surface::{BlendMode, DisplayList, DrawCommand, Surface};

// Effects and hosts share one glam version through this re-export.
pub use glam;
