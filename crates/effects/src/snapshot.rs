//! PNG snapshots of a [`Raster`].
//!
//! This module is feature-gated behind `png` (default on) so that WASM builds
//! can depend on the `effects` crate without pulling in the `image` crate.
//! The pixel buffer conversion itself lives in [`crate::pixel`] (always available).

use backdrop_core::color::Srgb;
use backdrop_core::error::EffectError;
use backdrop_core::raster::Raster;
use backdrop_core::surface::Surface;
use std::path::Path;

use crate::pixel::{raster_to_rgba, raster_to_rgba_over};

/// Writes the raster as a PNG, optionally flattened onto an opaque
/// `background`. Without one the PNG keeps the raster's transparency.
///
/// Returns `EffectError::InvalidDimensions` if the raster dimensions overflow
/// `u32`, or `EffectError::Io` on write failure.
pub fn write_png(
    raster: &Raster,
    background: Option<Srgb>,
    path: &Path,
) -> Result<(), EffectError> {
    let rgba = match background {
        Some(bg) => raster_to_rgba_over(raster, bg),
        None => raster_to_rgba(raster),
    };
    let w = u32::try_from(raster.width()).map_err(|_| EffectError::InvalidDimensions)?;
    let h = u32::try_from(raster.height()).map_err(|_| EffectError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EffectError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EffectError::Io(e.to_string()))?;
    tracing::debug!(path = %path.display(), width = w, height = h, "snapshot written");
    Ok(())
}
