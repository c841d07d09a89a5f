//! Lenient typed lookups into an effect's JSON parameter object.
//!
//! Missing keys and wrong JSON types fall back to the default. Colors are the
//! one exception: a present but unparseable color string is an error, since
//! silently ignoring a typo in `"#ff550"` is worse than refusing to start.

use crate::color::Srgb;
use crate::error::EffectError;
use serde_json::Value;

/// `params[name]` as f64 (integers accepted), else `default`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// `params[name]` as a non-negative integer, else `default`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Fails with `ParamOutOfRange` unless `min <= value <= max`. NaN fails.
pub fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), EffectError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(EffectError::ParamOutOfRange {
            name: name.to_owned(),
            reason: format!("must be within [{min}, {max}], got {value}"),
        })
    }
}

/// `params[name]` parsed as a hex color, else `default` parsed.
///
/// A value of the wrong JSON type is reported as a type mismatch rather than
/// falling back, because it almost always means a malformed config.
pub fn param_color(params: &Value, name: &str, default: &str) -> Result<Srgb, EffectError> {
    match params.get(name) {
        None | Some(Value::Null) => Srgb::from_hex(default),
        Some(Value::String(s)) => Srgb::from_hex(s),
        Some(other) => Err(EffectError::ParamTypeMismatch {
            name: name.to_owned(),
            expected: "color string".to_owned(),
            got: json_type_name(other).to_owned(),
        }),
    }
}

/// Human name of a JSON value's type, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_f64_reads_floats_and_integers() {
        let params = json!({"friction": 0.98, "density": 12000});
        assert!((param_f64(&params, "friction", 0.99) - 0.98).abs() < f64::EPSILON);
        assert!((param_f64(&params, "density", 0.0) - 12000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_falls_back_on_missing_wrong_type_or_null() {
        let params = json!({"a": "fast", "b": null});
        assert_eq!(param_f64(&params, "a", 1.0), 1.0);
        assert_eq!(param_f64(&params, "b", 2.0), 2.0);
        assert_eq!(param_f64(&params, "c", 3.0), 3.0);
        assert_eq!(param_f64(&json!("not an object"), "a", 4.0), 4.0);
    }

    #[test]
    fn param_usize_rejects_floats_and_negatives() {
        let params = json!({"n": 5000, "f": 2.5, "neg": -1});
        assert_eq!(param_usize(&params, "n", 0), 5000);
        assert_eq!(param_usize(&params, "f", 9), 9);
        assert_eq!(param_usize(&params, "neg", 7), 7);
    }

    #[test]
    fn check_range_accepts_inclusive_bounds() {
        assert!(check_range("friction", 0.0, 0.0, 1.0).is_ok());
        assert!(check_range("friction", 1.0, 0.0, 1.0).is_ok());
        assert!(check_range("friction", 0.5, 0.0, 1.0).is_ok());
    }

    #[test]
    fn check_range_rejects_outside_and_nan() {
        for value in [-1e-9, 1.000001, f64::NAN, f64::INFINITY] {
            match check_range("friction", value, 0.0, 1.0) {
                Err(EffectError::ParamOutOfRange { name, .. }) => assert_eq!(name, "friction"),
                other => panic!("{value} accepted: {other:?}"),
            }
        }
    }

    #[test]
    fn param_color_uses_default_when_absent_or_null() {
        let c = param_color(&json!({"inner": null}), "inner", "#ff5500").unwrap();
        assert_eq!(c.to_hex(), "#ff5500");
        let d = param_color(&json!({}), "inner", "#00d4ff").unwrap();
        assert_eq!(d.to_hex(), "#00d4ff");
    }

    #[test]
    fn param_color_parses_override() {
        let c = param_color(&json!({"inner": "#123456"}), "inner", "#ff5500").unwrap();
        assert_eq!(c.to_hex(), "#123456");
    }

    #[test]
    fn param_color_rejects_bad_string() {
        let err = param_color(&json!({"inner": "#12345"}), "inner", "#ff5500").unwrap_err();
        assert!(matches!(err, EffectError::InvalidColor(_)));
    }

    #[test]
    fn param_color_rejects_wrong_type() {
        let err = param_color(&json!({"inner": 42}), "inner", "#ff5500").unwrap_err();
        match err {
            EffectError::ParamTypeMismatch { name, got, .. } => {
                assert_eq!(name, "inner");
                assert_eq!(got, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
