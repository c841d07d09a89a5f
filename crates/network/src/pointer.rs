//! Pointer position shared between input handlers and the simulation.
//!
//! The simulation owns a [`PointerCell`] and hands clones to whatever
//! delivers pointer events. Handlers overwrite the whole value; the tick
//! reads it once, so a frame never sees half of an update.

use backdrop_core::glam::DVec2;
use std::cell::Cell;
use std::rc::Rc;

/// Last known pointer state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Pointer {
    /// Off the input surface. Attracts nothing and draws no links.
    #[default]
    Detached,
    /// Over the surface at this pixel position.
    At(DVec2),
}

impl Pointer {
    pub fn position(self) -> Option<DVec2> {
        match self {
            Pointer::Detached => None,
            Pointer::At(p) => Some(p),
        }
    }
}

/// Single-threaded shared pointer slot; clones see the same value.
#[derive(Debug, Clone, Default)]
pub struct PointerCell(Rc<Cell<Pointer>>);

impl PointerCell {
    /// A detached pointer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&self, x: f64, y: f64) {
        let p = DVec2::new(x, y);
        // Non-finite coordinates would poison every distance test.
        if p.is_finite() {
            self.0.set(Pointer::At(p));
        }
    }

    pub fn leave(&self) {
        self.0.set(Pointer::Detached);
    }

    pub fn get(&self) -> Pointer {
        self.0.get()
    }
}
