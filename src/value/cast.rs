// ABOUTME: Type coercion of dynamic values to declared scalar kinds
// ABOUTME: Implements the boolean/number/string casts used by bindings and parameters

use std::fmt;
use tracing::warn;

use super::Value;

/// Target kind of a cast, as declared by a parameter or binding argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastKind {
    Boolean,
    Number,
    String,
    /// A kind name nobody knows how to produce; casting to it is the identity
    Unsupported(String),
}

impl CastKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => CastKind::Boolean,
            "number" | "int" | "integer" | "float" => CastKind::Number,
            "string" | "str" => CastKind::String,
            _ => CastKind::Unsupported(name.trim().to_string()),
        }
    }

    /// Parse an optional kind name; empty names mean "no cast"
    pub fn parse_optional(name: Option<&str>) -> Option<Self> {
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .map(CastKind::parse)
    }

    pub fn as_str(&self) -> &str {
        match self {
            CastKind::Boolean => "boolean",
            CastKind::Number => "number",
            CastKind::String => "string",
            CastKind::Unsupported(name) => name,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (CastKind::Boolean, Value::Bool(_))
                | (CastKind::Number, Value::Number(_))
                | (CastKind::String, Value::String(_))
        )
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert `value` to `target`. Failures never propagate: an unparsable
/// number becomes `0` and an unknown target leaves the value untouched,
/// both with a diagnostic.
pub fn cast_value(value: Value, target: Option<&CastKind>) -> Value {
    let Some(target) = target else {
        return value;
    };
    if target.matches(&value) {
        return value;
    }

    match target {
        CastKind::Boolean => Value::Bool(to_boolean(&value)),
        CastKind::Number => Value::Number(to_number(&value)),
        CastKind::String => Value::String(to_string(&value)),
        CastKind::Unsupported(name) => {
            warn!("Unsupported cast target '{}', value left unchanged", name);
            value
        }
    }
}

fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n == 1.0,
        Value::String(s) => s == "1" || s == "true",
        _ => false,
    }
}

fn to_number(value: &Value) -> f64 {
    let text = value.to_string();
    let parsed = if text.contains('.') {
        parse_float_prefix(&text)
    } else {
        parse_int_prefix(&text)
    };

    match parsed {
        Some(n) => n,
        None => {
            warn!("Cannot cast '{}' to number, using 0", text);
            0.0
        }
    }
}

fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Structured(json) => serde_json::to_string(json).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Leading-integer parse: whitespace, optional sign, then decimal digits.
/// Trailing text ("12px") is ignored.
fn parse_int_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let (sign, digits) = split_sign(s);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<f64>().ok().map(|n| sign * n)
}

/// Leading-float parse: digits with an optional fraction and exponent.
fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let (sign, rest) = split_sign(s);
    let bytes = rest.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    rest[..end].parse::<f64>().ok().map(|n| sign * n)
}

fn split_sign(s: &str) -> (f64, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (-1.0, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (1.0, rest)
    } else {
        (1.0, s)
    }
}
