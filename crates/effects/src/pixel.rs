//! Pure-computation pixel buffer conversion from a [`Raster`].
//!
//! This module is always available (no feature gate) so that both the `png`
//! snapshot path and any `ImageData` path can share the same conversion.

use backdrop_core::color::Srgb;
use backdrop_core::raster::Raster;
use backdrop_core::surface::Surface;

/// Straight-alpha RGBA8 bytes of the raster, `width * height * 4` long.
///
/// Both effects draw onto a transparent surface, so uncovered pixels keep
/// alpha 0.
pub fn raster_to_rgba(raster: &Raster) -> Vec<u8> {
    raster.to_rgba8()
}

/// Composites the raster over an opaque `background` and returns RGBA8 bytes
/// with alpha 255 everywhere.
pub fn raster_to_rgba_over(raster: &Raster, background: Srgb) -> Vec<u8> {
    let bg = [background.r, background.g, background.b].map(|c| c.clamp(0.0, 1.0));
    let quantize = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    let (w, h) = (raster.width(), raster.height());
    (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            let [r, g, b, a] = raster.pixel(x, y).unwrap_or([0.0; 4]);
            let over = |src: f64, dst: f64| src * a + dst * (1.0 - a);
            [
                quantize(over(r, bg[0])),
                quantize(over(g, bg[1])),
                quantize(over(b, bg[2])),
                255u8,
            ]
        })
        .collect()
}
