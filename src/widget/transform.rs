// ABOUTME: Value transforms applied to parameter values before rendering
// ABOUTME: Pipe-separated chains such as "trim|toUpperCase"; non-string values pass through

use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    UpperCase,
    LowerCase,
    Trim,
    EscapeQuotes,
}

impl Transform {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "toUpperCase" | "upper" => Some(Transform::UpperCase),
            "toLowerCase" | "lower" => Some(Transform::LowerCase),
            "trim" => Some(Transform::Trim),
            "escapeQuotes" => Some(Transform::EscapeQuotes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transform::UpperCase => "toUpperCase",
            Transform::LowerCase => "toLowerCase",
            Transform::Trim => "trim",
            Transform::EscapeQuotes => "escapeQuotes",
        }
    }

    pub fn apply(&self, value: Value) -> Value {
        let Value::String(text) = value else {
            return value;
        };
        Value::String(match self {
            Transform::UpperCase => text.to_uppercase(),
            Transform::LowerCase => text.to_lowercase(),
            Transform::Trim => text.trim().to_string(),
            Transform::EscapeQuotes => text.replace('"', "&quot;").replace('\'', "&#39;"),
        })
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a pipe-separated chain. Returns the first unknown name on failure.
pub fn parse_chain(spec: &str) -> std::result::Result<Vec<Transform>, String> {
    spec.split('|')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Transform::parse(name).ok_or_else(|| name.to_string()))
        .collect()
}

pub fn apply_chain(chain: &[Transform], value: Value) -> Value {
    chain.iter().fold(value, |value, transform| transform.apply(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        let chain = parse_chain("trim | toUpperCase").unwrap();
        assert_eq!(apply_chain(&chain, Value::from("  nota ")), Value::from("NOTA"));
        assert_eq!(apply_chain(&chain, Value::Number(3.0)), Value::Number(3.0));
    }

    #[test]
    fn test_escape_quotes() {
        let value = Transform::EscapeQuotes.apply(Value::from(r#"say "hi" it's"#));
        assert_eq!(value, Value::from("say &quot;hi&quot; it&#39;s"));
    }

    #[test]
    fn test_unknown_transform() {
        assert_eq!(parse_chain("trim|shout"), Err("shout".to_string()));
    }
}
