#![deny(unsafe_code)]
//! Effect registry: maps effect names to implementations and provides
//! CPU-side snapshot rendering.
//!
//! This crate sits between `backdrop-core` (which defines the `Effect` trait)
//! and the effect crates (`backdrop-disk`, `backdrop-network`). Both the CLI
//! and the WASM host depend on it so name dispatch lives in one place.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use backdrop_core::error::EffectError;
use backdrop_core::surface::Surface;
use backdrop_core::Effect;
use backdrop_disk::DiskField;
use backdrop_network::NetworkField;
use serde_json::Value;

/// All available effect names.
const EFFECT_NAMES: &[&str] = &["disk", "network"];

/// Enumeration of all available background effects.
///
/// Wraps each effect implementation and delegates `Effect` trait methods.
/// Use [`EffectKind::from_name`] for string-based construction (CLI, WASM).
pub enum EffectKind {
    /// Accretion disk around an occluding sphere.
    Disk(DiskField),
    /// Pointer-reactive particle network.
    Network(NetworkField),
}

impl EffectKind {
    /// Constructs an effect by name.
    ///
    /// Returns `EffectError::UnknownEffect` if the name is not recognized.
    pub fn from_name(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EffectError> {
        let effect = match name {
            "disk" => EffectKind::Disk(DiskField::from_json(width, height, seed, params)?),
            "network" => {
                EffectKind::Network(NetworkField::from_json(width, height, seed, params)?)
            }
            _ => return Err(EffectError::UnknownEffect(name.to_string())),
        };
        tracing::info!(effect = name, width, height, seed, "effect constructed");
        Ok(effect)
    }

    /// Returns a slice of all recognized effect names.
    pub fn list_effects() -> &'static [&'static str] {
        EFFECT_NAMES
    }

    /// Registry name of this effect.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Disk(_) => "disk",
            EffectKind::Network(_) => "network",
        }
    }
}

impl Effect for EffectKind {
    fn update(&mut self, elapsed_secs: f64) {
        match self {
            EffectKind::Disk(e) => e.update(elapsed_secs),
            EffectKind::Network(e) => e.update(elapsed_secs),
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        match self {
            EffectKind::Disk(e) => e.draw(surface),
            EffectKind::Network(e) => e.draw(surface),
        }
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EffectError> {
        match self {
            EffectKind::Disk(e) => e.resize(width, height),
            EffectKind::Network(e) => e.resize(width, height),
        }
    }

    fn size(&self) -> (usize, usize) {
        match self {
            EffectKind::Disk(e) => e.size(),
            EffectKind::Network(e) => e.size(),
        }
    }

    fn pointer_moved(&mut self, x: f64, y: f64) {
        match self {
            EffectKind::Disk(e) => e.pointer_moved(x, y),
            EffectKind::Network(e) => e.pointer_moved(x, y),
        }
    }

    fn pointer_left(&mut self) {
        match self {
            EffectKind::Disk(e) => e.pointer_left(),
            EffectKind::Network(e) => e.pointer_left(),
        }
    }

    fn params(&self) -> Value {
        match self {
            EffectKind::Disk(e) => e.params(),
            EffectKind::Network(e) => e.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            EffectKind::Disk(e) => e.param_schema(),
            EffectKind::Network(e) => e.param_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::frame::{AnimationLoop, ManualScheduler};
    use backdrop_core::surface::DisplayList;
    use serde_json::json;

    #[test]
    fn from_name_known_effects_succeed() {
        for name in EffectKind::list_effects() {
            let effect = EffectKind::from_name(name, 64, 48, 42, &json!({})).unwrap();
            assert_eq!(effect.name(), *name);
            assert_eq!(effect.size(), (64, 48));
        }
    }

    #[test]
    fn from_name_unknown_returns_error() {
        let result = EffectKind::from_name("nonexistent", 32, 32, 42, &json!({}));
        assert!(matches!(result, Err(EffectError::UnknownEffect(_))));
    }

    #[test]
    fn from_name_propagates_param_errors() {
        let result = EffectKind::from_name("disk", 32, 32, 42, &json!({"inner_color": "nope"}));
        assert!(matches!(result, Err(EffectError::InvalidColor(_))));
    }

    #[test]
    fn from_name_rejects_zero_dimensions() {
        let result = EffectKind::from_name("network", 0, 32, 42, &json!({}));
        assert!(matches!(result, Err(EffectError::InvalidDimensions)));
    }

    #[test]
    fn list_effects_includes_both() {
        let names = EffectKind::list_effects();
        assert!(names.contains(&"disk"));
        assert!(names.contains(&"network"));
    }

    #[test]
    fn trait_delegation_params_and_schema() {
        let disk = EffectKind::from_name("disk", 16, 16, 42, &json!({})).unwrap();
        assert!(disk.params().get("particle_count").is_some());
        assert!(disk.param_schema().get("particle_count").is_some());

        let network = EffectKind::from_name("network", 16, 16, 42, &json!({})).unwrap();
        assert!(network.params().get("density").is_some());
        assert!(network.param_schema().get("density").is_some());
    }

    #[test]
    fn pointer_is_forwarded_to_network() {
        let mut effect = EffectKind::from_name("network", 800, 600, 1, &json!({})).unwrap();
        effect.pointer_moved(400.0, 300.0);
        let EffectKind::Network(network) = &effect else {
            panic!("expected network");
        };
        assert!(network.pointer_handle().get().position().is_some());
        effect.pointer_left();
        let EffectKind::Network(network) = &effect else {
            panic!("expected network");
        };
        assert!(network.pointer_handle().get().position().is_none());
    }

    #[test]
    fn determinism_same_seed() {
        let mut a = EffectKind::from_name("disk", 64, 64, 99, &json!({})).unwrap();
        let mut b = EffectKind::from_name("disk", 64, 64, 99, &json!({})).unwrap();
        for i in 0..10 {
            a.update(i as f64 / 60.0);
            b.update(i as f64 / 60.0);
        }
        let mut la = DisplayList::new(64, 64);
        let mut lb = DisplayList::new(64, 64);
        a.draw(&mut la);
        b.draw(&mut lb);
        assert_eq!(la.commands(), lb.commands());
    }

    #[test]
    fn both_effects_run_under_animation_loop() {
        for name in EffectKind::list_effects() {
            let effect = EffectKind::from_name(name, 320, 240, 7, &json!({})).unwrap();
            let mut scheduler = ManualScheduler::new();
            let mut surface = DisplayList::new(320, 240);
            let mut animation = AnimationLoop::new(effect);
            animation.start(&mut scheduler, 0.0).unwrap();
            for i in 0..5 {
                if scheduler.take_pending().is_some() {
                    animation
                        .on_frame(i as f64 / 60.0, &mut surface, &mut scheduler)
                        .unwrap();
                }
            }
            animation.stop(&mut scheduler);
            assert_eq!(animation.frames(), 5, "{name}");
            assert!(!surface.commands().is_empty(), "{name} drew nothing");
        }
    }

    #[test]
    fn object_safety() {
        let effect = EffectKind::from_name("network", 16, 16, 42, &json!({})).unwrap();
        let boxed: Box<dyn Effect> = Box::new(effect);
        assert_eq!(boxed.size(), (16, 16));
    }
}
