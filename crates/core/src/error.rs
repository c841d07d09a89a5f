//! Error types shared by every backdrop effect and host.

use thiserror::Error;

/// Errors produced while constructing, resizing or hosting an effect.
///
/// The per-frame update and draw paths never fail; everything here happens
/// at setup time or at the host boundary.
#[derive(Debug, Error)]
pub enum EffectError {
    /// Width or height was zero, or their product overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A parameter existed but had the wrong JSON type.
    #[error("parameter type mismatch for '{name}': expected {expected}, got {got}")]
    ParamTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// A parameter was outside the range the effect accepts.
    #[error("parameter '{name}' out of range: {reason}")]
    ParamOutOfRange { name: String, reason: String },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// No effect is registered under this name.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// The host environment refused a request (no canvas, no animation frame).
    #[error("host error: {0}")]
    Host(String),
}
