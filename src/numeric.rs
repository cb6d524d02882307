//! Numeric guard for computed values.
//!
//! Every value that leaves the engine passes through [`checked`], which
//! maps `NaN`, infinities and missing values to `0.0`. All arithmetic is
//! carried out in `f64`, including aggregation across many records.

use serde_json::Value;

/// The guarded zero.
pub const ZERO: f64 = 0.0;

/// Normalize a computed value to a finite number.
///
/// `NaN` and both infinities become `0.0`; any finite value is returned
/// unchanged. The function is idempotent.
///
/// # Examples
///
/// ```rust
/// use statcrunch::numeric::checked;
///
/// assert_eq!(checked(f64::NAN), 0.0);
/// assert_eq!(checked(f64::INFINITY), 0.0);
/// assert_eq!(checked(2.5), 2.5);
/// ```
#[inline]
pub fn checked(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        ZERO
    }
}

/// Normalize an optional value, treating `None` as missing.
///
/// # Examples
///
/// ```rust
/// use statcrunch::numeric::checked_value;
///
/// assert_eq!(checked_value(None), 0.0);
/// assert_eq!(checked_value(Some(4.0)), 4.0);
/// ```
#[inline]
pub fn checked_value(value: Option<f64>) -> f64 {
    value.map(checked).unwrap_or(ZERO)
}

/// Coerce an arbitrary leaf value to a number.
///
/// Numbers convert directly, booleans count as `1.0`/`0.0`, and every
/// other value (strings, lists, mappings, null) contributes `0.0`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::numeric::coerce;
/// use serde_json::json;
///
/// assert_eq!(coerce(&json!(3)), 3.0);
/// assert_eq!(coerce(&json!(true)), 1.0);
/// assert_eq!(coerce(&json!("a")), 0.0);
/// ```
pub fn coerce(value: &Value) -> f64 {
    match value {
        Value::Number(n) => checked_value(n.as_f64()),
        Value::Bool(true) => 1.0,
        _ => ZERO,
    }
}
