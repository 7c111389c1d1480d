// ABOUTME: Restricted expression language used by template macros and accessor bindings
// ABOUTME: Exposes compile/evaluate entry points over an explicit AST, never arbitrary code

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod scope;

pub use ast::Expr;
pub use error::{EvalError, Result};
pub use eval::{Evaluator, FunctionMode};
pub use scope::{NativeFunction, Scope};

use crate::value::Value;

/// Compile an expression once for repeated evaluation
pub fn compile(source: &str) -> Result<Expr> {
    parser::parse(source)
}

/// Evaluate `source` against the variables of `scope`. Functions defined on
/// the scope are not reachable from the expression.
pub fn evaluate(scope: &Scope, source: &str) -> Result<Value> {
    let expr = compile(source)?;
    Evaluator::new(scope, FunctionMode::Filtered).eval(&expr)
}

/// Evaluate `source` with the scope's functions callable. Only accessor
/// bindings use this mode.
pub fn evaluate_with_functions(scope: &Scope, source: &str) -> Result<Value> {
    let expr = compile(source)?;
    Evaluator::new(scope, FunctionMode::Keep).eval(&expr)
}

/// Evaluate an already compiled expression
pub fn evaluate_compiled(scope: &Scope, expr: &Expr, mode: FunctionMode) -> Result<Value> {
    Evaluator::new(scope, mode).eval(expr)
}
