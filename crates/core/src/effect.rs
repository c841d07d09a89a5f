//! The `Effect` trait every animated background implements.
//!
//! The trait is object-safe so hosts can hold `Box<dyn Effect>` and switch
//! between effects at runtime.

use crate::error::EffectError;
use crate::surface::Surface;
use serde_json::Value;

/// A per-frame procedural animation.
///
/// Hosts call [`update`](Effect::update) then [`draw`](Effect::draw) once per
/// display refresh. Neither can fail: all fallible work (parameter parsing,
/// dimension checks) happens at construction or in
/// [`resize`](Effect::resize).
pub trait Effect {
    /// Advances the simulation by one tick.
    ///
    /// `elapsed_secs` is wall-clock time since the animation started. Effects
    /// that integrate with a fixed per-tick step use it only for time-based
    /// decoration such as camera drift.
    fn update(&mut self, elapsed_secs: f64);

    /// Renders the current state.
    fn draw(&self, surface: &mut dyn Surface);

    /// Re-derives size-dependent state after the host viewport changed.
    ///
    /// Returns `EffectError::InvalidDimensions` for a zero-sized viewport.
    fn resize(&mut self, width: usize, height: usize) -> Result<(), EffectError>;

    /// Current viewport size in pixels.
    fn size(&self) -> (usize, usize);

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Type, default, range and description of every parameter.
    fn param_schema(&self) -> Value;

    /// The pointer moved to `(x, y)` in surface pixels.
    fn pointer_moved(&mut self, _x: f64, _y: f64) {}

    /// The pointer left the input surface.
    fn pointer_left(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DisplayList;
    use serde_json::json;

    struct Blink {
        on: bool,
        size: (usize, usize),
    }

    impl Effect for Blink {
        fn update(&mut self, _elapsed_secs: f64) {
            self.on = !self.on;
        }

        fn draw(&self, surface: &mut dyn Surface) {
            surface.clear();
        }

        fn resize(&mut self, width: usize, height: usize) -> Result<(), EffectError> {
            crate::seed::validate_dimensions(width, height)?;
            self.size = (width, height);
            Ok(())
        }

        fn size(&self) -> (usize, usize) {
            self.size
        }

        fn params(&self) -> Value {
            json!({"on": self.on})
        }

        fn param_schema(&self) -> Value {
            json!({"on": {"type": "boolean", "default": false, "description": "lamp state"}})
        }
    }

    #[test]
    fn effect_is_object_safe() {
        let mut effect: Box<dyn Effect> = Box::new(Blink {
            on: false,
            size: (4, 4),
        });
        effect.update(0.0);
        assert_eq!(effect.params()["on"], true);
        let mut list = DisplayList::new(4, 4);
        effect.draw(&mut list);
        assert_eq!(list.commands().len(), 1);
    }

    #[test]
    fn pointer_hooks_default_to_noops() {
        let mut effect = Blink {
            on: false,
            size: (4, 4),
        };
        effect.pointer_moved(1.0, 2.0);
        effect.pointer_left();
        assert!(!effect.on);
    }

    #[test]
    fn resize_reports_new_size_and_rejects_zero() {
        let mut effect = Blink {
            on: false,
            size: (4, 4),
        };
        effect.resize(10, 20).unwrap();
        assert_eq!(effect.size(), (10, 20));
        assert!(matches!(
            effect.resize(0, 20),
            Err(EffectError::InvalidDimensions)
        ));
        assert_eq!(effect.size(), (10, 20));
    }
}
