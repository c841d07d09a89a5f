//! [`Surface`] over a 2D canvas context.

use backdrop_core::color::Rgba;
use backdrop_core::glam::DVec2;
use backdrop_core::surface::{BlendMode, Surface};
use std::f64::consts::TAU;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// `globalCompositeOperation` value for a blend mode.
pub fn composite_operation(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::Normal => "source-over",
        BlendMode::Additive => "lighter",
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: usize,
    height: usize,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        let width = canvas.width() as usize;
        let height = canvas.height() as usize;
        Self {
            canvas,
            ctx,
            width,
            height,
        }
    }

    /// Sets the backing store size. The canvas resets its context state.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.width = width;
        self.height = height;
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.set_blend_mode(BlendMode::Normal);
        self.ctx
            .clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        // Only fails for unknown operation names.
        let _ = self
            .ctx
            .set_global_composite_operation(composite_operation(mode));
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        if !(radius > 0.0) {
            return;
        }
        self.ctx.begin_path();
        if self.ctx.arc(center.x, center.y, radius, 0.0, TAU).is_err() {
            return;
        }
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: DVec2, to: DVec2, line_width: f64, color: Rgba) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width);
        self.ctx.stroke();
    }
}
