//! Coercion of loosely formatted monetary values into finite numbers.
//!
//! Upstream documents store amounts as numbers, as decorated strings such as
//! `"$1,200.50"`, or not at all. Everything funnels through
//! [`sanitize_amount`] at normalization time so the in-memory model is always
//! numeric.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce an arbitrary JSON value into a finite amount.
///
/// `null`, booleans, arrays and objects become `0.0`. Numbers pass through.
/// Strings go through [`sanitize_amount_text`].
///
/// # Examples
/// ```
/// use broker_admin::domain::sanitize_amount;
/// use serde_json::json;
///
/// assert_eq!(sanitize_amount(&json!("$1,200.50")), 1200.5);
/// assert_eq!(sanitize_amount(&json!(null)), 0.0);
/// assert_eq!(sanitize_amount(&json!("n/a")), 0.0);
/// ```
pub fn sanitize_amount(raw: &Value) -> f64 {
    match raw {
        Value::Number(number) => finite_or_zero(number.as_f64().unwrap_or(0.0)),
        Value::String(text) => sanitize_amount_text(text),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// Coerce amount text into a finite number.
///
/// Every character other than ASCII digits, `.` and `-` is dropped, then the
/// remainder must parse as a whole. Leftovers such as `--5`, `1-2` or
/// `1.2.3` do not parse and yield `0.0`.
pub fn sanitize_amount_text(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().map_or(0.0, finite_or_zero)
}

/// Serde helper for optional amount fields in inbound payloads.
///
/// Any JSON shape is accepted and sanitized; an absent field stays `None`.
pub fn deserialize_sanitized_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(|value| sanitize_amount(&value)))
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
