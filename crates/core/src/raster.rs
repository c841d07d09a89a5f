//! CPU [`Surface`] backed by a premultiplied RGBA buffer.
//!
//! Used for headless rendering and PNG snapshots. Shapes are anti-aliased by
//! estimating pixel coverage from the distance between the pixel center and
//! the shape edge; shapes thinner than a pixel are drawn one pixel wide with
//! proportionally reduced alpha, the way a browser canvas renders hairlines.

use glam::DVec2;

use crate::color::Rgba;
use crate::error::EffectError;
use crate::seed::validate_dimensions;
use crate::surface::{BlendMode, Surface};

#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    /// Premultiplied sRGB + alpha, row-major.
    pixels: Vec<[f64; 4]>,
    blend: BlendMode,
}

impl Raster {
    /// A transparent raster. Fails on zero or overflowing dimensions.
    pub fn new(width: usize, height: usize) -> Result<Self, EffectError> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
            blend: BlendMode::Normal,
        })
    }

    /// Straight-alpha RGBA of pixel `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f64; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(unpremultiply(self.pixels[y * self.width + x]))
    }

    /// Straight-alpha RGBA8 bytes, row-major, `width * height * 4` long.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&p| {
                let [r, g, b, a] = unpremultiply(p);
                [quantize(r), quantize(g), quantize(b), quantize(a)]
            })
            .collect()
    }

    /// Number of pixels with any alpha.
    pub fn covered_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0.0).count()
    }

    fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba, coverage: f64) {
        let a = color.alpha * coverage;
        if a <= 0.0 {
            return;
        }
        let src = [
            color.color.r.clamp(0.0, 1.0) * a,
            color.color.g.clamp(0.0, 1.0) * a,
            color.color.b.clamp(0.0, 1.0) * a,
            a,
        ];
        let dst = &mut self.pixels[y * self.width + x];
        match self.blend {
            BlendMode::Normal => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = s + *d * (1.0 - a);
                }
            }
            BlendMode::Additive => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = (*d + s).min(1.0);
                }
            }
        }
    }

    /// Pixel index range covering `[lo, hi]` along one axis, clipped.
    fn span(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
        let start = lo.floor().max(0.0);
        let end = hi.ceil().min(len as f64);
        if !(start < end) {
            return None;
        }
        Some((start as usize, end as usize))
    }
}

impl Surface for Raster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
        self.blend = BlendMode::Normal;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        if !(radius > 0.0) || !center.is_finite() {
            return;
        }
        let (r, fade) = thin_shape(radius, 0.5);
        let Some((x0, x1)) = Self::span(center.x - r - 1.0, center.x + r + 1.0, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(center.y - r - 1.0, center.y + r + 1.0, self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (r + 0.5 - p.distance(center)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color, coverage * fade);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: DVec2, to: DVec2, line_width: f64, color: Rgba) {
        if !(line_width > 0.0) || !from.is_finite() || !to.is_finite() {
            return;
        }
        let (half, fade) = thin_shape(line_width / 2.0, 0.5);
        let lo = from.min(to) - DVec2::splat(half + 1.0);
        let hi = from.max(to) + DVec2::splat(half + 1.0);
        let Some((x0, x1)) = Self::span(lo.x, hi.x, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(lo.y, hi.y, self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (half + 0.5 - distance_to_segment(p, from, to)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color, coverage * fade);
                }
            }
        }
    }
}

/// Widens a sub-pixel extent to `min` and returns the alpha factor that
/// keeps its total ink roughly constant.
fn thin_shape(extent: f64, min: f64) -> (f64, f64) {
    if extent >= min {
        (extent, 1.0)
    } else {
        (min, extent / min)
    }
}

fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn unpremultiply(p: [f64; 4]) -> [f64; 4] {
    let a = p[3];
    if a <= 0.0 {
        return [0.0; 4];
    }
    [
        (p[0] / a).min(1.0),
        (p[1] / a).min(1.0),
        (p[2] / a).min(1.0),
        a,
    ]
}

fn quantize(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}
