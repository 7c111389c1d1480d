// ABOUTME: Substitution and section tags left in expanded template text
// ABOUTME: Lists the context names they read and inlines names bound by var/for/each

use std::sync::OnceLock;

use handlebars::html_escape;
use regex::{Captures, Regex};

use crate::value::Value;

/// `{{name}}`, `{{{name}}}`, `{{& name}}`, `{{#name}}`, `{{^name}}` with an
/// optional dotted path after the name
fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"\{\{(\{)?\s*([#^&])?\s*([A-Za-z_$][\w$-]*)((?:\.[\w$-]+)*)\s*(\})?\}\}").ok()
    })
    .as_ref()
}

/// Names the substitution engine resolves itself
const RESERVED: [&str; 2] = ["this", "else"];

/// Make `text` come out of the substitution pass verbatim
pub fn literal(text: &str) -> String {
    text.replace("{{", "\\{{")
}

fn is_escaped(text: &str, caps: &Captures) -> bool {
    caps.get(0)
        .map(|m| text[..m.start()].ends_with('\\'))
        .unwrap_or(false)
}

/// Root names read by the tags in `text`, in order of appearance
pub fn referenced_names(text: &str) -> Vec<&str> {
    let Some(pattern) = tag_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .filter(|caps| !is_escaped(text, caps))
        .filter_map(|caps| caps.get(3).map(|m| m.as_str()))
        .filter(|name| !RESERVED.contains(name))
        .collect()
}

/// Replace value tags whose root name `lookup` resolves. Section tags and
/// names `lookup` does not know are left for the substitution pass.
pub fn inline_values<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str, &[&str]) -> Option<Value>,
{
    let Some(pattern) = tag_pattern() else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            if is_escaped(text, caps) {
                return whole.to_string();
            }
            let triple = caps.get(1).is_some();
            let sigil = caps.get(2).map(|m| m.as_str());
            if triple != caps.get(5).is_some() || matches!(sigil, Some("#") | Some("^")) {
                return whole.to_string();
            }
            let (Some(root), Some(rest)) = (caps.get(3), caps.get(4)) else {
                return whole.to_string();
            };
            let path: Vec<&str> = rest.as_str().split('.').filter(|s| !s.is_empty()).collect();
            match lookup(root.as_str(), &path) {
                Some(value) => {
                    let text = value.to_string();
                    if triple || sigil == Some("&") {
                        literal(&text)
                    } else {
                        literal(&html_escape(&text))
                    }
                }
                None => whole.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_names() {
        let text = "{{a}} {{{b.c}}} {{& d}} {{#e}}{{this}}{{/e}} {{^f}}{{else}}{{/f}} \\{{g}} {{h i}}";
        assert_eq!(referenced_names(text), vec!["a", "b", "d", "e", "f"]);
    }

    #[test]
    fn test_inline_values() {
        let lookup = |name: &str, path: &[&str]| match (name, path) {
            ("i", []) => Some(Value::Number(2.0)),
            ("s", []) => Some(Value::from("<{{x}}>")),
            _ => None,
        };
        assert_eq!(inline_values("{{i}}-{{ i }}-{{other}}", lookup), "2-2-{{other}}");
        assert_eq!(inline_values("{{s}}", lookup), "&lt;\\{{x}}&gt;");
        assert_eq!(inline_values("{{{s}}}|{{& s}}", lookup), "<\\{{x}}>|<\\{{x}}>");
        assert_eq!(inline_values("{{#i}}x{{/i}} \\{{i}}", lookup), "{{#i}}x{{/i}} \\{{i}}");
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal("{{a}} and {{{b}}}"), "\\{{a}} and \\{{{b}}}");
    }
}
