// ABOUTME: Abstract syntax tree of the restricted expression language
// ABOUTME: Compiled once, evaluated any number of times against different scopes

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Member {
        object: Box<Expr>,
        field: String,
    },
    /// Call of a scope function; dotted callees (`classList.add`) are kept whole
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

impl Expr {
    /// Dotted path of a variable/member chain (`a.b.c`), if the expression is one
    pub fn as_path(&self) -> Option<String> {
        match self {
            Expr::Variable(name) => Some(name.clone()),
            Expr::Member { object, field } => object.as_path().map(|p| format!("{}.{}", p, field)),
            _ => None,
        }
    }

    /// Collect every free variable the expression reads
    pub fn variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Member { object, .. } => object.variables(out),
            Expr::Call { args, .. } => args.iter().for_each(|a| a.variables(out)),
            Expr::Unary { operand, .. } => operand.variables(out),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.variables(out);
                right.variables(out);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.variables(out);
                consequent.variables(out);
                alternate.variables(out);
            }
        }
    }
}
