//! Lenient conversions from parsed records into typed fields.
//!
//! Model output is untrusted: numbers arrive as strings, booleans as
//! "yes", priorities as "High". Each converter picks a documented default
//! instead of failing.

use super::Record;
use serde_json::Value;

/// Priority used when a response carries none or an unreadable one
pub const DEFAULT_PRIORITY: u8 = 3;

/// Confidence used when a response carries an unreadable one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// First non-empty string (or number) among `keys`
pub fn text(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn text_or(record: &Record, keys: &[&str], default: &str) -> String {
    text(record, keys).unwrap_or_else(|| default.to_string())
}

/// Priority in 1..=3; words high/medium/low are accepted
pub fn priority(record: &Record) -> u8 {
    record
        .get("priority")
        .and_then(priority_value)
        .unwrap_or(DEFAULT_PRIORITY)
}

fn priority_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_f64().map(|p| p.round().clamp(1.0, 3.0) as u8),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            let s = s.trim_start_matches('p');
            if let Ok(p) = s.parse::<f64>() {
                return Some(p.round().clamp(1.0, 3.0) as u8);
            }
            match s.split_whitespace().next()? {
                "high" | "critical" | "urgent" => Some(1),
                "medium" | "moderate" => Some(2),
                "low" => Some(3),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn boolean(record: &Record, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}

/// Confidence in 0.0..=1.0; percentages are scaled down
pub fn confidence(record: &Record) -> f64 {
    let raw = match record.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok().map(|v| v / 100.0),
                None => s.parse::<f64>().ok(),
            }
        }
        _ => None,
    };

    match raw {
        Some(v) if v.is_finite() && v > 1.0 && v <= 100.0 => v / 100.0,
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Non-negative integer index, accepting numeric strings
pub fn index(record: &Record, key: &str) -> Option<usize> {
    match record.get(key)? {
        Value::Number(n) => n.as_u64().map(|v| v as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings from an array value; object entries contribute their first text field
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => text(map, &["item", "text", "description", "name"]),
            _ => None,
        })
        .collect()
}
