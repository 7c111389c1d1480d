// ABOUTME: Compiled form of a widget template
// ABOUTME: Macro nodes (if/var/for/each/eval/I18n) over text that still carries substitution tags

use super::tags;
use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Handlebars source: substitutions and sections, everything else escaped
    Text(String),
    If {
        condition: Expr,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    Var { assignments: Vec<Assignment> },
    For { header: ForHeader, body: Vec<Node> },
    /// Nested counted loops, outermost first
    Each { loops: Vec<Assignment>, body: Vec<Node> },
    Eval { expr: Expr },
    I18n { key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForHeader {
    pub variable: String,
    pub start: Expr,
    pub comparator: Comparator,
    pub bound: Expr,
    pub step: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
}

impl Comparator {
    /// Longest symbols first so `<=` is not read as `<`
    pub const SYMBOLS: [(&'static str, Comparator); 5] = [
        ("<=", Comparator::LessEqual),
        (">=", Comparator::GreaterEqual),
        ("!=", Comparator::NotEqual),
        ("<", Comparator::Less),
        (">", Comparator::Greater),
    ];

    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Comparator::Less => left < right,
            Comparator::LessEqual => left <= right,
            Comparator::Greater => left > right,
            Comparator::GreaterEqual => left >= right,
            Comparator::NotEqual => left != right,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, Comparator::Greater | Comparator::GreaterEqual)
    }
}

impl Template {
    /// Names of the macros used, in first-use order
    pub fn block_names(&self) -> Vec<String> {
        fn walk(nodes: &[Node], out: &mut Vec<String>) {
            for node in nodes {
                let (name, children): (&str, Vec<&[Node]>) = match node {
                    Node::Text(_) => continue,
                    Node::If {
                        then_branch,
                        else_branch,
                        ..
                    } => ("if", vec![then_branch.as_slice(), else_branch.as_slice()]),
                    Node::Var { .. } => ("var", vec![]),
                    Node::For { body, .. } => ("for", vec![body.as_slice()]),
                    Node::Each { body, .. } => ("each", vec![body.as_slice()]),
                    Node::Eval { .. } => ("eval", vec![]),
                    Node::I18n { .. } => ("I18n", vec![]),
                };
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
                for child in children {
                    walk(child, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Message keys requested through `{{#I18n}}`
    pub fn translation_keys(&self) -> Vec<String> {
        fn walk(nodes: &[Node], out: &mut Vec<String>) {
            for node in nodes {
                match node {
                    Node::I18n { key } => {
                        if !out.contains(key) {
                            out.push(key.clone());
                        }
                    }
                    Node::For { body, .. } | Node::Each { body, .. } => walk(body, out),
                    Node::If {
                        then_branch,
                        else_branch,
                        ..
                    } => {
                        walk(then_branch, out);
                        walk(else_branch, out);
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Context variables read by substitutions, sections and expressions.
    /// Names the template binds itself (`var`, `for`, `each`) are left out.
    pub fn variables(&self) -> Vec<String> {
        fn walk(nodes: &[Node], out: &mut Vec<String>, bound: &mut Vec<String>) {
            for node in nodes {
                match node {
                    Node::I18n { .. } => {}
                    Node::Text(text) => {
                        for name in tags::referenced_names(text) {
                            if !out.iter().any(|n| n == name) {
                                out.push(name.to_string());
                            }
                        }
                    }
                    Node::If {
                        condition,
                        then_branch,
                        else_branch,
                    } => {
                        condition.variables(out);
                        walk(then_branch, out, bound);
                        walk(else_branch, out, bound);
                    }
                    Node::Var { assignments } => {
                        for assignment in assignments {
                            assignment.value.variables(out);
                            bound.push(assignment.name.clone());
                        }
                    }
                    Node::For { header, body } => {
                        header.start.variables(out);
                        header.bound.variables(out);
                        header.step.variables(out);
                        bound.push(header.variable.clone());
                        walk(body, out, bound);
                    }
                    Node::Each { loops, body } => {
                        for assignment in loops {
                            assignment.value.variables(out);
                            bound.push(assignment.name.clone());
                        }
                        walk(body, out, bound);
                    }
                    Node::Eval { expr } => expr.variables(out),
                }
            }
        }
        let mut out = Vec::new();
        let mut bound = Vec::new();
        walk(&self.nodes, &mut out, &mut bound);
        out.retain(|name| !bound.contains(name));
        out
    }
}
