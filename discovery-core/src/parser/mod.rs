//! Tolerant parsing of semi-structured model output.
//!
//! Responses are tried against three tiers in order and the first success
//! wins:
//!
//! 1. a fenced ```` ```json ```` block, decoded as the expected shape
//! 2. the whole response (or its outermost bracketed span) decoded directly
//! 3. a line heuristic over `key: value` pairs from a fixed vocabulary
//!
//! Nothing here returns an error; a response that fits no tier parses to
//! [`Parsed::Empty`].

pub mod fields;

#[cfg(test)]
mod tests;

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// One structured record from a model response
pub type Record = Map<String, Value>;

/// Keys recognised by the line heuristic
pub const HEURISTIC_KEYS: &[&str] = &[
    "question",
    "context",
    "priority",
    "item",
    "category",
    "target_stakeholder",
    "risk_level",
    "answer_found",
    "answer",
    "confidence",
    "explanation",
];

/// The shape a caller expects from a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Object,
}

/// Parse result tagged with the tier that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Fenced(T),
    Direct(T),
    Heuristic(T),
    Empty,
}

impl<T: Default> Parsed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Parsed::Fenced(v) | Parsed::Direct(v) | Parsed::Heuristic(v) => v,
            Parsed::Empty => T::default(),
        }
    }
}

impl<T> Parsed<T> {
    pub fn tier(&self) -> &'static str {
        match self {
            Parsed::Fenced(_) => "fenced",
            Parsed::Direct(_) => "direct",
            Parsed::Heuristic(_) => "heuristic",
            Parsed::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Parsed::Empty)
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        match self {
            Parsed::Fenced(v) => Parsed::Fenced(f(v)),
            Parsed::Direct(v) => Parsed::Direct(f(v)),
            Parsed::Heuristic(v) => Parsed::Heuristic(f(v)),
            Parsed::Empty => Parsed::Empty,
        }
    }
}

/// Parse a response into a JSON value of the expected shape
pub fn parse_structured(text: &str, shape: Shape) -> Parsed<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Parsed::Empty;
    }

    for block in fenced_blocks(text) {
        if let Some(value) = decode_as(block, shape) {
            return Parsed::Fenced(value);
        }
    }

    if let Some(value) = decode_as(text, shape).or_else(|| decode_span(text, shape)) {
        return Parsed::Direct(value);
    }

    if shape == Shape::List {
        let salvaged = salvage_objects(text);
        if !salvaged.is_empty() {
            return Parsed::Heuristic(Value::Array(
                salvaged.into_iter().map(Value::Object).collect(),
            ));
        }
    }

    let records = heuristic_records(text);
    if records.is_empty() {
        return Parsed::Empty;
    }
    match shape {
        Shape::List => Parsed::Heuristic(Value::Array(
            records.into_iter().map(Value::Object).collect(),
        )),
        Shape::Object => records
            .into_iter()
            .next()
            .map(|r| Parsed::Heuristic(Value::Object(r)))
            .unwrap_or(Parsed::Empty),
    }
}

/// Parse a response expected to hold a list of records.
///
/// Non-object list entries are dropped.
pub fn parse_list(text: &str) -> Parsed<Vec<Record>> {
    let parsed = parse_structured(text, Shape::List).map(|value| match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    });
    match parsed {
        Parsed::Fenced(v) | Parsed::Direct(v) | Parsed::Heuristic(v) if v.is_empty() => {
            Parsed::Empty
        }
        other => other,
    }
}

/// Parse a response expected to hold a single object
pub fn parse_object(text: &str) -> Parsed<Record> {
    parse_structured(text, Shape::Object).map(|value| match value {
        Value::Object(map) => map,
        _ => Record::new(),
    })
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?is)```\s*json\s*\n?(.*?)```").unwrap()
    })
}

fn fenced_blocks(text: &str) -> Vec<&str> {
    fence_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim()))
        .collect()
}

fn decode_as(text: &str, shape: Shape) -> Option<Value> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    coerce(value, shape)
}

/// Decode the outermost bracketed span when the model wrapped JSON in prose
fn decode_span(text: &str, shape: Shape) -> Option<Value> {
    let (open, close) = match shape {
        Shape::List => ('[', ']'),
        Shape::Object => ('{', '}'),
    };
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    decode_as(&text[start..=end], shape)
}

fn coerce(value: Value, shape: Shape) -> Option<Value> {
    match (shape, value) {
        (Shape::List, Value::Array(items)) => Some(Value::Array(items)),
        (Shape::List, Value::Object(map)) => {
            // {"questions": [...]} style wrappers
            let inner = map
                .values()
                .find(|v| matches!(v, Value::Array(items) if items.iter().any(Value::is_object)))
                .cloned();
            Some(inner.unwrap_or(Value::Array(vec![Value::Object(map)])))
        }
        (Shape::Object, Value::Object(map)) => Some(Value::Object(map)),
        _ => None,
    }
}

/// Complete top-level `{...}` objects from truncated or corrupted JSON
pub fn salvage_objects(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match (escaped, ch) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        if let Ok(Value::Object(map)) = serde_json::from_str(&text[begin..=idx]) {
                            records.push(map);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    records
}

fn key_line_regex() -> &'static Regex {
    static KEY_LINE: OnceLock<Regex> = OnceLock::new();
    KEY_LINE.get_or_init(|| {
        Regex::new(r"^(?:[-*•]\s*|\d+[.)]\s*)?\**\s*([A-Za-z][A-Za-z _]*?)\s*\**\s*:\s*(.*)$")
            .unwrap()
    })
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"(?i)^[#*\s]*question\s*#?\s*(\d+)\s*\**\s*[:.)]?\s*\**\s*(.*)$").unwrap()
    })
}

/// Line-oriented fallback.
///
/// A record is flushed when a key repeats within it, when a
/// `Question N` header appears, and at end of input.
pub fn heuristic_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = header_regex().captures(line) {
            flush(&mut records, &mut current);
            if let Ok(index) = caps[1].parse::<u64>() {
                current.insert("question_index".to_string(), Value::from(index));
            }
            let rest = caps[2].trim().trim_matches('*').trim();
            if !rest.is_empty() {
                current.insert("question".to_string(), Value::String(rest.to_string()));
            }
            continue;
        }

        let Some(caps) = key_line_regex().captures(line) else {
            continue;
        };
        let key = caps[1].trim().to_lowercase().replace(' ', "_");
        if !HEURISTIC_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = caps[2].trim().trim_matches('*').trim().to_string();

        if current.contains_key(&key) {
            flush(&mut records, &mut current);
        }
        current.insert(key, Value::String(value));
    }

    flush(&mut records, &mut current);
    records
}

fn flush(records: &mut Vec<Record>, current: &mut Record) {
    let has_content = current.keys().any(|k| k != "question_index");
    if has_content {
        records.push(std::mem::take(current));
    } else {
        current.clear();
    }
}
