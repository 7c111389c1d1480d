// ABOUTME: CSS selector subset used by binding queries and widget root detection
// ABOUTME: Supports type, class, id and attribute selectors with descendant and child combinators

use super::element::Element;
use super::error::{DomError, Result};

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrSelector>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// A comma-separated list of selectors; an element matches if any does
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self> {
        let selectors = split_top_level(source)
            .into_iter()
            .map(|part| ComplexSelector::parse(part.trim(), source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// `ancestors` runs from the outermost ancestor to the parent
    pub fn matches(&self, element: &Element, ancestors: &[Element]) -> bool {
        self.selectors
            .iter()
            .any(|s| s.matches_at(s.compounds.len() - 1, element, ancestors))
    }
}

fn invalid(selector: &str, reason: impl Into<String>) -> DomError {
    DomError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

/// Split on commas outside of brackets and quotes
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

impl ComplexSelector {
    fn parse(source: &str, full: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(invalid(full, "empty selector"));
        }
        let chars: Vec<char> = source.chars().collect();
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut i = 0;
        let mut pending: Option<Combinator> = None;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                if !compounds.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
                i += 1;
                continue;
            }
            if c == '>' {
                if compounds.is_empty() {
                    return Err(invalid(full, "combinator without left-hand selector"));
                }
                pending = Some(Combinator::Child);
                i += 1;
                continue;
            }

            let (compound, next) = parse_compound(&chars, i, full)?;
            if !compounds.is_empty() {
                combinators.push(pending.take().unwrap_or(Combinator::Descendant));
            }
            pending = None;
            compounds.push(compound);
            i = next;
        }

        if compounds.is_empty() {
            return Err(invalid(full, "empty selector"));
        }
        if pending == Some(Combinator::Child) {
            return Err(invalid(full, "dangling '>' combinator"));
        }
        Ok(Self {
            compounds,
            combinators,
        })
    }

    fn matches_at(&self, index: usize, element: &Element, ancestors: &[Element]) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => self.matches_at(index - 1, parent, rest),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len())
                .rev()
                .any(|i| self.matches_at(index - 1, &ancestors[i], &ancestors[..i])),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_name(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_name_char(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_compound(chars: &[char], start: usize, full: &str) -> Result<(Compound, usize)> {
    let mut compound = Compound::default();
    let mut i = start;

    if chars[i] == '*' {
        i += 1;
    } else if is_name_char(chars[i]) {
        let (tag, next) = read_name(chars, i);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let (name, next) = read_name(chars, i + 1);
                if name.is_empty() {
                    return Err(invalid(full, "expected class name after '.'"));
                }
                compound.classes.push(name);
                i = next;
            }
            '#' => {
                let (name, next) = read_name(chars, i + 1);
                if name.is_empty() {
                    return Err(invalid(full, "expected id after '#'"));
                }
                compound.id = Some(name);
                i = next;
            }
            '[' => {
                let (attr, next) = parse_attribute(chars, i + 1, full)?;
                compound.attributes.push(attr);
                i = next;
            }
            c if c.is_whitespace() || c == '>' => break,
            c => return Err(invalid(full, format!("unexpected character '{}'", c))),
        }
    }

    if i == start {
        return Err(invalid(full, "expected a selector"));
    }
    Ok((compound, i))
}

fn parse_attribute(chars: &[char], start: usize, full: &str) -> Result<(AttrSelector, usize)> {
    let mut i = start;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    let (name, next) = read_name(chars, i);
    if name.is_empty() {
        return Err(invalid(full, "expected attribute name"));
    }
    i = next;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }

    let op_char = match chars.get(i) {
        Some(']') => {
            return Ok((
                AttrSelector {
                    name: name.to_ascii_lowercase(),
                    op: AttrOp::Exists,
                },
                i + 1,
            ))
        }
        Some('=') => None,
        Some(c @ ('^' | '$' | '*' | '~')) if chars.get(i + 1) == Some(&'=') => {
            i += 1;
            Some(*c)
        }
        _ => return Err(invalid(full, "malformed attribute selector")),
    };
    i += 1;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }

    let value: String = match chars.get(i) {
        Some(q @ ('"' | '\'')) => {
            let close = chars[i + 1..]
                .iter()
                .position(|c| c == q)
                .ok_or_else(|| invalid(full, "unterminated attribute value"))?;
            let value = chars[i + 1..i + 1 + close].iter().collect();
            i += close + 2;
            value
        }
        _ => {
            let end = chars[i..]
                .iter()
                .position(|c| *c == ']' || c.is_whitespace())
                .map(|p| i + p)
                .unwrap_or(chars.len());
            let value = chars[i..end].iter().collect();
            i = end;
            value
        }
    };
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if chars.get(i) != Some(&']') {
        return Err(invalid(full, "expected ']'"));
    }

    let op = match op_char {
        None => AttrOp::Equals(value),
        Some('^') => AttrOp::Prefix(value),
        Some('$') => AttrOp::Suffix(value),
        Some('*') => AttrOp::Contains(value),
        _ => AttrOp::Word(value),
    };
    Ok((
        AttrSelector {
            name: name.to_ascii_lowercase(),
            op,
        },
        i + 1,
    ))
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag_name() != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.get_attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            let Some(actual) = element.get_attribute(&attr.name) else {
                return false;
            };
            match &attr.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => actual == *v,
                AttrOp::Prefix(v) => !v.is_empty() && actual.starts_with(v.as_str()),
                AttrOp::Suffix(v) => !v.is_empty() && actual.ends_with(v.as_str()),
                AttrOp::Contains(v) => !v.is_empty() && actual.contains(v.as_str()),
                AttrOp::Word(v) => actual.split_whitespace().any(|w| w == v),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (Element, Element) {
        let target = Element::new("img")
            .with_attribute("class", "photo wide")
            .with_attribute("data-role", "main image");
        let root = Element::new("div").with_attribute("id", "root").with_child(
            Element::new("figure").with_child(target.clone()),
        );
        (root, target)
    }

    #[test]
    fn test_compound_and_attribute_selectors() {
        let (root, target) = tree();
        for selector in [
            "img",
            ".photo.wide",
            "img[data-role]",
            "[data-role~=image]",
            "[data-role^='main']",
            "figure img",
            "div#root > figure > img",
            "ul, img.photo",
        ] {
            let found = root.query_selector(selector).unwrap();
            assert!(
                found.is_some_and(|el| el.ptr_eq(&target)),
                "selector {} did not match",
                selector
            );
        }
    }

    #[test]
    fn test_non_matching_selectors() {
        let (root, _) = tree();
        for selector in ["div > img", "img.missing", "[data-role=main]", "span"] {
            assert!(root.query_selector(selector).unwrap().is_none(), "{}", selector);
        }
    }

    #[test]
    fn test_invalid_selectors() {
        for selector in ["", "> a", "a >", "a[", "a[x=\"y]", ".", "a!"] {
            assert!(SelectorList::parse(selector).is_err(), "{}", selector);
        }
    }
}
