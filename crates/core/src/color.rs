//! Color types used by the effects and surfaces.
//!
//! `Srgb` is what users write (hex strings) and what surfaces consume.
//! `LinearRgb` is the working space for gradients, matching how a 3D
//! renderer blends vertex colors before its sRGB output pass.

use crate::error::EffectError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB color, nominally in [0, 1] per component.
///
/// Serializes as `"#rrggbb"`. Components outside [0, 1] are allowed in
/// memory (extrapolated gradients produce them) and clamped on output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Gamma-decoded RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub color: Srgb,
    pub alpha: f64,
}

impl Srgb {
    pub const BLACK: Srgb = Srgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Srgb = Srgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Builds a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Parses `"#rrggbb"` or `"rrggbb"`, case insensitive.
    ///
    /// Returns `EffectError::InvalidColor` for anything else.
    pub fn from_hex(hex: &str) -> Result<Srgb, EffectError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(EffectError::InvalidColor(format!(
                "expected 6 hex digits in {hex:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|e| EffectError::InvalidColor(format!("invalid {name} in {hex:?}: {e}")))
        };
        Ok(Self::from_rgb8(
            channel(0..2, "red")?,
            channel(2..4, "green")?,
            channel(4..6, "blue")?,
        ))
    }

    /// Formats as `"#rrggbb"` after clamping to [0, 1].
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Clamps to [0, 1] and quantizes each channel to 8 bits.
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Same color with the given alpha.
    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba::new(self, alpha)
    }
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Srgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl LinearRgb {
    /// Linear interpolation toward `other`. `t` is not clamped, so values
    /// outside [0, 1] extrapolate past either endpoint.
    pub fn lerp(self, other: LinearRgb, t: f64) -> LinearRgb {
        LinearRgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Narrows to the f32 triple a vertex color buffer stores.
    pub fn to_f32_array(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    pub fn from_f32_array(c: [f32; 3]) -> Self {
        Self {
            r: c[0] as f64,
            g: c[1] as f64,
            b: c[2] as f64,
        }
    }
}

impl Rgba {
    /// Alpha is clamped to [0, 1].
    pub fn new(color: Srgb, alpha: f64) -> Self {
        Self {
            color,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// CSS `rgba(r, g, b, a)` string, as a 2D canvas context expects.
    pub fn to_css(self) -> String {
        let [r, g, b] = self.color.to_rgb8();
        format!("rgba({r}, {g}, {b}, {})", self.alpha)
    }
}

fn srgb_component_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

// The linear segment also covers negative input, so extrapolated colors
// never hit `powf` on a negative base.
fn linear_component_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Applies inverse sRGB gamma.
pub fn srgb_to_linear(c: Srgb) -> LinearRgb {
    LinearRgb {
        r: srgb_component_to_linear(c.r),
        g: srgb_component_to_linear(c.g),
        b: srgb_component_to_linear(c.b),
    }
}

/// Applies sRGB gamma.
pub fn linear_to_srgb(c: LinearRgb) -> Srgb {
    Srgb {
        r: linear_component_to_srgb(c.r),
        g: linear_component_to_srgb(c.g),
        b: linear_component_to_srgb(c.b),
    }
}
