// 🔢 Amount Parsing - Lenient numeric input
//
// Form values arrive while the user is still typing: empty boxes, half-typed
// numbers, "R$ 1.200,50", nulls. None of that is an error here. Anything that
// does not read as a finite number is 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Replace NaN and infinities with 0
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse a typed amount, falling back to 0
///
/// Accepts "1200", "1200.5", "-30", "1200,50", "1.200,50" and an optional "R$" prefix.
pub fn parse(input: &str) -> f64 {
    let s = input.trim();
    let s = s.strip_prefix("R$").unwrap_or(s).trim();

    if s.is_empty() {
        return 0.0;
    }

    // pt-BR: "." groups thousands, "," is the decimal mark
    let normalized = if let Some(decimal_mark) = s.rfind(',') {
        // "1,234.56" mixes in US grouping: not a pt-BR amount
        if s[decimal_mark..].contains('.') {
            return 0.0;
        }
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };

    normalized.parse::<f64>().map(sanitize).unwrap_or(0.0)
}

/// Coerce an arbitrary JSON value to an amount
pub fn from_json(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map(sanitize).unwrap_or(0.0),
        Value::String(s) => parse(s),
        _ => 0.0,
    }
}

/// serde adapter: `#[serde(default, deserialize_with = "amount::deserialize")]`
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(from_json(&value))
}

/// serde adapter for a list of amounts; anything that is not a list reads as empty
pub fn deserialize_seq<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().map(from_json).collect(),
        _ => Vec::new(),
    })
}
