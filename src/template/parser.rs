// ABOUTME: Compiles template source into the macro node tree
// ABOUTME: Scans {{ }} tags, extracts inline [...] macro parameters and leaves substitutions as handlebars text

use tracing::{debug, warn};

use super::ast::{Assignment, Comparator, ForHeader, Node, Template};
use super::error::{RenderError, Result};
use super::tags::literal;
use crate::expr::ast::UnaryOp;
use crate::expr::{self, Expr};
use crate::value::Value;

/// Macros that take a `[...]` parameter right after the opening tag
const PARAM_MACROS: [&str; 4] = ["if", "var", "for", "each"];

/// Macros whose body is read verbatim instead of being parsed as template
const RAW_MACROS: [&str; 2] = ["eval", "I18n"];

#[derive(Debug)]
enum Segment {
    /// Handlebars-ready text
    Text(String),
    Open {
        name: String,
        inverted: bool,
        param: Option<String>,
        start: usize,
    },
    Close {
        name: String,
        start: usize,
        end: usize,
    },
    Else {
        start: usize,
        end: usize,
    },
    Raw {
        name: String,
        body: String,
    },
}

pub fn parse(source: &str) -> Result<Template> {
    let segments = scan(source)?;
    build(source, segments)
}

/// Normalized substitution tag; `.` is the current section item
fn substitution(path: &str, escape: bool) -> String {
    let path = if path == "." { "this" } else { path };
    if escape {
        format!("{{{{{}}}}}", path)
    } else {
        format!("{{{{{{{}}}}}}}", path)
    }
}

fn scan(source: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find("{{") {
        let start = pos + found;
        text.push_str(&source[pos..start]);

        if source[start..].starts_with("{{{") {
            let inner_start = start + 3;
            let close = source[inner_start..]
                .find("}}}")
                .ok_or_else(|| RenderError::syntax("unterminated '{{{' tag", start))?;
            let end = inner_start + close + 3;
            let path = source[inner_start..inner_start + close].trim();
            if is_path(path) {
                text.push_str(&substitution(path, false));
            } else {
                text.push_str(&literal(&source[start..end]));
            }
            pos = end;
            continue;
        }

        let inner_start = start + 2;
        let close = source[inner_start..]
            .find("}}")
            .ok_or_else(|| RenderError::syntax("unterminated '{{' tag", start))?;
        let inner = source[inner_start..inner_start + close].trim();
        let mut end = inner_start + close + 2;

        let segment = if inner.starts_with('!') {
            None
        } else if let Some(name) = inner.strip_prefix('#').map(str::trim) {
            if RAW_MACROS.contains(&name) {
                let close_tag = format!("{{{{/{}}}}}", name);
                let body_len = source[end..].find(&close_tag).ok_or_else(|| {
                    RenderError::syntax(format!("unclosed {{{{#{}}}}}", name), start)
                })?;
                let body = source[end..end + body_len].to_string();
                end += body_len + close_tag.len();
                Some(Segment::Raw {
                    name: name.to_string(),
                    body,
                })
            } else if PARAM_MACROS.contains(&name) {
                if !source[end..].starts_with('[') {
                    return Err(RenderError::syntax(
                        format!("{{{{#{}}}}} requires a [...] parameter", name),
                        start,
                    ));
                }
                let bracket = matching_bracket(source, end).ok_or_else(|| {
                    RenderError::syntax(format!("unterminated parameter of {{{{#{}}}}}", name), end)
                })?;
                let param = source[end + 1..bracket].to_string();
                end = bracket + 1;
                Some(Segment::Open {
                    name: name.to_string(),
                    inverted: false,
                    param: Some(param),
                    start,
                })
            } else if is_name(name) {
                Some(Segment::Open {
                    name: name.to_string(),
                    inverted: false,
                    param: None,
                    start,
                })
            } else {
                Some(Segment::Text(literal(&source[start..end])))
            }
        } else if let Some(name) = inner.strip_prefix('^').map(str::trim) {
            if is_name(name) {
                Some(Segment::Open {
                    name: name.to_string(),
                    inverted: true,
                    param: None,
                    start,
                })
            } else {
                Some(Segment::Text(literal(&source[start..end])))
            }
        } else if let Some(name) = inner.strip_prefix('/') {
            Some(Segment::Close {
                name: name.trim().to_string(),
                start,
                end,
            })
        } else if inner == "else" {
            Some(Segment::Else { start, end })
        } else {
            let (path, escape) = match inner.strip_prefix('&') {
                Some(path) => (path.trim(), false),
                None => (inner, true),
            };
            if is_path(path) {
                Some(Segment::Text(substitution(path, escape)))
            } else {
                debug!("Passing through unknown tag {}", &source[start..end]);
                Some(Segment::Text(literal(&source[start..end])))
            }
        };

        match segment {
            Some(Segment::Text(chunk)) => text.push_str(&chunk),
            Some(segment) => {
                flush(&mut text, &mut segments);
                segments.push(segment);
            }
            None => {}
        }
        pos = end;
    }

    text.push_str(&source[pos..]);
    flush(&mut text, &mut segments);
    Ok(segments)
}

fn flush(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

/// A single context key: what a section can open on
fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '-'))
}

/// `name`, `a.b.c` or `.` (the current section item)
fn is_path(text: &str) -> bool {
    text == "." || text.split('.').all(is_name)
}

/// Byte index of the `]` closing the `[` at `open`, skipping quoted text
fn matching_bracket(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in source[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `separator` outside quotes and brackets
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut last = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[last..i]);
                last = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[last..]);
    parts
}

struct Block {
    name: String,
    inverted: bool,
    param: Option<String>,
    start: usize,
    children: Vec<Node>,
    else_children: Option<Vec<Node>>,
}

impl Block {
    /// `{{else}}` splits `if` macros and plain sections, once
    fn takes_else(&self) -> bool {
        let splittable = match &self.param {
            Some(_) => self.name == "if",
            None => !self.inverted,
        };
        splittable && self.else_children.is_none()
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match &mut self.else_children {
            Some(children) => children,
            None => &mut self.children,
        }
    }
}

fn build(source: &str, segments: Vec<Segment>) -> Result<Template> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Block> = Vec::new();

    for segment in segments {
        let node = match segment {
            Segment::Text(text) => Node::Text(text),
            Segment::Raw { name, body } => {
                if name == "eval" {
                    Node::Eval {
                        expr: expr::compile(body.trim())?,
                    }
                } else {
                    Node::I18n {
                        key: body.trim().to_string(),
                    }
                }
            }
            Segment::Open {
                name,
                inverted,
                param,
                start,
            } => {
                stack.push(Block {
                    name,
                    inverted,
                    param,
                    start,
                    children: Vec::new(),
                    else_children: None,
                });
                continue;
            }
            Segment::Else { start, end } => match stack.last_mut() {
                Some(block) if block.takes_else() => {
                    block.else_children = Some(Vec::new());
                    continue;
                }
                _ => Node::Text(literal(&source[start..end])),
            },
            Segment::Close { name, start, end } => {
                let Some(block) = stack.pop() else {
                    return Err(RenderError::syntax(
                        format!("unexpected {{{{/{}}}}}", name),
                        start,
                    ));
                };
                if block.name != name {
                    return Err(RenderError::syntax(
                        format!("expected {{{{/{}}}}} but found {{{{/{}}}}}", block.name, name),
                        start,
                    ));
                }
                let target = match stack.last_mut() {
                    Some(parent) => parent.current(),
                    None => &mut root,
                };
                for node in finish(&source[block.start..end], block)? {
                    push_node(target, node);
                }
                continue;
            }
        };

        let target = match stack.last_mut() {
            Some(block) => block.current(),
            None => &mut root,
        };
        push_node(target, node);
    }

    if let Some(block) = stack.pop() {
        return Err(RenderError::syntax(
            format!("unclosed {{{{#{}}}}}", block.name),
            block.start,
        ));
    }

    Ok(Template { nodes: root })
}

fn push_node(target: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node {
        if let Some(Node::Text(previous)) = target.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    target.push(node);
}

/// Close a block. Sections flatten back into handlebars text around their
/// children; malformed macro parameters leave the whole block as literal text.
fn finish(raw: &str, block: Block) -> Result<Vec<Node>> {
    let Block {
        name,
        inverted,
        param,
        children,
        else_children,
        ..
    } = block;

    let param = match param {
        Some(param) => param,
        None => {
            let open = if inverted {
                format!("{{{{#{}}}}}{{{{else}}}}", name)
            } else {
                format!("{{{{#{}}}}}", name)
            };
            let mut nodes = vec![Node::Text(open)];
            nodes.extend(children);
            if let Some(else_children) = else_children {
                nodes.push(Node::Text("{{else}}".to_string()));
                nodes.extend(else_children);
            }
            nodes.push(Node::Text(format!("{{{{/{}}}}}", name)));
            return Ok(nodes);
        }
    };

    let node = match name.as_str() {
        "if" => Some(Node::If {
            condition: expr::compile(&param)?,
            then_branch: children,
            else_branch: else_children.unwrap_or_default(),
        }),
        "var" => parse_assignments(&param).map(|assignments| Node::Var { assignments }),
        "for" => parse_for(&param).map(|header| Node::For {
            header,
            body: children,
        }),
        "each" => parse_each(&param).map(|loops| Node::Each {
            loops,
            body: children,
        }),
        _ => None,
    };

    Ok(vec![node.unwrap_or_else(|| {
        warn!("Malformed parameter [{}] on {{{{#{}}}}}; emitting it as text", param, name);
        Node::Text(literal(raw))
    })])
}

fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let name_len = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (name, rest) = text.split_at(name_len);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let value = rest.trim_start().strip_prefix('=')?;
    if value.starts_with('=') {
        return None;
    }
    Some((name, value))
}

fn parse_assignments(param: &str) -> Option<Vec<Assignment>> {
    let assignments = split_top_level(param, ';')
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (name, value) = split_assignment(part)?;
            Some(Assignment {
                name: name.to_string(),
                value: expr::compile(value).ok()?,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    (!assignments.is_empty()).then_some(assignments)
}

/// Loop variable names used when `each` does not name one: i, j, k, ...
fn default_loop_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 18 => char::from(b'i' + offset).to_string(),
        _ => format!("i{}", index),
    }
}

fn parse_each(param: &str) -> Option<Vec<Assignment>> {
    let loops = split_top_level(param, ',')
        .into_iter()
        .enumerate()
        .map(|(index, part)| {
            let (name, value) = match split_assignment(part) {
                Some((name, value)) => (name.to_string(), value),
                None => (default_loop_name(index), part),
            };
            if value.trim().is_empty() {
                return None;
            }
            Some(Assignment {
                name,
                value: expr::compile(value).ok()?,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    (!loops.is_empty()).then_some(loops)
}

fn number(n: f64) -> Expr {
    Expr::Literal(Value::Number(n))
}

fn parse_for(param: &str) -> Option<ForHeader> {
    let parts: Vec<&str> = split_top_level(param, ';')
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let (variable, start) = split_assignment(parts[0])?;
    let start = expr::compile(start).ok()?;

    let condition = parts[1].trim().strip_prefix(variable)?.trim_start();
    let (comparator, bound) = Comparator::SYMBOLS
        .iter()
        .find_map(|(symbol, comparator)| condition.strip_prefix(symbol).map(|rest| (*comparator, rest)))?;
    if bound.starts_with('=') {
        return None;
    }
    let bound = expr::compile(bound).ok()?;

    let step = match parts.get(2) {
        Some(step) => parse_step(variable, step)?,
        None if comparator.is_descending() => number(-1.0),
        None => number(1.0),
    };

    Some(ForHeader {
        variable: variable.to_string(),
        start,
        comparator,
        bound,
        step,
    })
}

fn parse_step(variable: &str, text: &str) -> Option<Expr> {
    let rest = text.trim().strip_prefix(variable)?.trim();
    match rest {
        "++" => Some(number(1.0)),
        "--" => Some(number(-1.0)),
        _ => {
            if let Some(amount) = rest.strip_prefix("+=") {
                expr::compile(amount).ok()
            } else if let Some(amount) = rest.strip_prefix("-=") {
                expr::compile(amount).ok().map(|amount| Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(amount),
                })
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(result: Result<Template>) -> usize {
        match result {
            Err(RenderError::Syntax { offset, .. }) => offset,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_substitutions_stay_as_text() {
        let template = parse("Hi {{name}}, {{{html}}} {{& raw}} {{.}}{{! note }}!").unwrap();
        assert_eq!(
            template.nodes,
            vec![Node::Text("Hi {{name}}, {{{html}}} {{{raw}}} {{this}}!".into())]
        );
    }

    #[test]
    fn test_sections_flatten_around_macros() {
        let template =
            parse("{{#items}}{{#eval}}1{{/eval}}{{else}}none{{/items}}{{^show}}x{{/show}}").unwrap();
        assert_eq!(template.nodes.len(), 3);
        assert_eq!(template.nodes[0], Node::Text("{{#items}}".into()));
        assert!(matches!(template.nodes[1], Node::Eval { .. }));
        assert_eq!(
            template.nodes[2],
            Node::Text("{{else}}none{{/items}}{{#show}}{{else}}x{{/show}}".into())
        );
    }

    #[test]
    fn test_if_else_and_params() {
        let template = parse("{{#if}}[a > 1 && b == ']']yes{{else}}no{{/if}}").unwrap();
        match &template.nodes[0] {
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch, &vec![Node::Text("yes".into())]);
                assert_eq!(else_branch, &vec![Node::Text("no".into())]);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_for_header_forms() {
        let header = parse_for("i=10; i>0").unwrap();
        assert_eq!(header.comparator, Comparator::Greater);
        assert_eq!(header.step, number(-1.0));

        let header = parse_for("k=0;k<=n;k+=2").unwrap();
        assert_eq!(header.variable, "k");
        assert_eq!(header.comparator, Comparator::LessEqual);

        assert!(parse_for("i=0").is_none());
        assert!(parse_for("i=0;j<3").is_none());
        assert!(parse_for("i=0;i<3;i*=2").is_none());
    }

    #[test]
    fn test_each_default_names() {
        let loops = parse_each("2, x=3, 4").unwrap();
        let names: Vec<&str> = loops.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["i", "x", "k"]);
    }

    #[test]
    fn test_malformed_parameter_is_literal() {
        let template = parse("a{{#for}}[nonsense]b{{/for}}c").unwrap();
        assert_eq!(
            template.nodes,
            vec![Node::Text("a\\{{#for}}[nonsense]b\\{{/for}}c".into())]
        );
    }

    #[test]
    fn test_unknown_tags_are_escaped() {
        let template = parse("{{foo bar}} {{#x y}} {{else}} {{#a.b}}").unwrap();
        assert_eq!(
            template.nodes,
            vec![Node::Text("\\{{foo bar}} \\{{#x y}} \\{{else}} \\{{#a.b}}".into())]
        );
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(offset_of(parse("ab{{#show}}x")), 2);
        assert_eq!(offset_of(parse("{{#a}}{{/b}}")), 6);
        assert_eq!(offset_of(parse("x{{/a}}")), 1);
        assert_eq!(offset_of(parse("Hello {{name}")), 6);
        assert_eq!(offset_of(parse("{{#if}}yes{{/if}}")), 0);
        assert_eq!(offset_of(parse("{{#eval}}1+1")), 0);
    }

    #[test]
    fn test_raw_macros() {
        let template = parse("{{#eval}} 1 + 2 {{/eval}}{{#I18n}} msg {{/I18n}}").unwrap();
        assert!(matches!(template.nodes[0], Node::Eval { .. }));
        assert_eq!(template.nodes[1], Node::I18n { key: "msg".into() });
    }

    #[test]
    fn test_expression_errors_propagate() {
        assert!(matches!(
            parse("{{#if}}[1 +]x{{/if}}"),
            Err(RenderError::Eval(_))
        ));
    }
}
