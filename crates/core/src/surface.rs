//! The drawing target effects render onto.
//!
//! A [`Surface`] is a minimal immediate-mode 2D API: clear, filled circles and
//! stroked lines in pixel coordinates (origin top-left, y down), each drawn
//! with the current [`BlendMode`]. The CPU [`Raster`](crate::raster::Raster),
//! the recording [`DisplayList`] and the browser canvas host all implement it.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// How a new shape combines with what is already on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over alpha compositing.
    #[default]
    Normal,
    /// Source color scaled by alpha is added to the destination.
    Additive,
}

pub trait Surface {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Resets every pixel to transparent black and the blend mode to `Normal`.
    fn clear(&mut self);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba);

    fn stroke_line(&mut self, from: DVec2, to: DVec2, line_width: f64, color: Rgba);
}

/// One recorded [`Surface`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetBlendMode(BlendMode),
    FillCircle {
        center: DVec2,
        radius: f64,
        color: Rgba,
    },
    StrokeLine {
        from: DVec2,
        to: DVec2,
        line_width: f64,
        color: Rgba,
    },
}

/// A surface that records commands instead of rasterizing them.
///
/// `clear` drops everything recorded so far, so after a frame the list holds
/// exactly that frame's commands.
#[derive(Debug, Clone)]
pub struct DisplayList {
    width: usize,
    height: usize,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// All recorded lines as `(from, to, line_width, color)`.
    pub fn lines(&self) -> impl Iterator<Item = (DVec2, DVec2, f64, Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::StrokeLine {
                from,
                to,
                line_width,
                color,
            } => Some((from, to, line_width, color)),
            _ => None,
        })
    }

    /// All recorded circles as `(center, radius, color)`.
    pub fn circles(&self) -> impl Iterator<Item = (DVec2, f64, Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => Some((center, radius, color)),
            _ => None,
        })
    }
}

impl Surface for DisplayList {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::SetBlendMode(mode));
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: DVec2, to: DVec2, line_width: f64, color: Rgba) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            line_width,
            color,
        });
    }
}
