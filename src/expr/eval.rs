// ABOUTME: Tree-walking evaluator for compiled expressions
// ABOUTME: Implements loose arithmetic, comparison and logical semantics over Value

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::error::{EvalError, Result};
use super::scope::Scope;
use crate::value::Value;

/// Whether scope functions are reachable from the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionMode {
    Filtered,
    Keep,
}

pub struct Evaluator<'s> {
    scope: &'s Scope,
    mode: FunctionMode,
}

impl<'s> Evaluator<'s> {
    pub fn new(scope: &'s Scope, mode: FunctionMode) -> Self {
        Self { scope, mode }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => self
                .scope
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedIdentifier(name.clone())),
            Expr::Member { object, field } => {
                let object = self.eval(object)?;
                Ok(object.field(field).unwrap_or(Value::Null))
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.as_number()),
                    UnaryOp::Plus => Value::Number(value.as_number()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn call(&self, callee: &str, args: &[Expr]) -> Result<Value> {
        if self.mode == FunctionMode::Filtered {
            return Err(EvalError::FunctionsDisabled(callee.to_string()));
        }
        let function = self
            .scope
            .function(callee)
            .ok_or_else(|| EvalError::UnknownFunction(callee.to_string()))?
            .clone();
        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>>>()?;
        function(&values)
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.as_number() - right.as_number()),
        BinaryOp::Mul => Value::Number(left.as_number() * right.as_number()),
        BinaryOp::Div => Value::Number(left.as_number() / right.as_number()),
        BinaryOp::Rem => Value::Number(left.as_number() % right.as_number()),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LessEqual => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GreaterEqual => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::Equal => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEqual => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEqual => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEqual => Value::Bool(!strict_equals(left, right)),
    }
}

fn add(left: &Value, right: &Value) -> Value {
    let concatenates = |v: &Value| matches!(v, Value::String(_) | Value::Structured(_));
    if concatenates(left) || concatenates(right) {
        Value::String(format!("{}{}", left, right))
    } else {
        Value::Number(left.as_number() + right.as_number())
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return test(a.cmp(b));
    }
    left.as_number()
        .partial_cmp(&right.as_number())
        .is_some_and(test)
}

pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Structured(a), Value::Structured(b)) => a == b,
        (Value::Structured(_), _) | (_, Value::Structured(_)) => {
            left.to_string() == right.to_string()
        }
        _ => left.as_number() == right.as_number(),
    }
}

pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse;

    fn eval(source: &str, scope: &Scope) -> Result<Value> {
        Evaluator::new(scope, FunctionMode::Filtered).eval(&parse(source).unwrap())
    }

    #[test]
    fn test_arithmetic_and_concat() {
        let scope = Scope::from_values([("n", Value::from(3)), ("s", Value::from("px"))]);
        assert_eq!(eval("n * 2 + 1", &scope).unwrap(), Value::from(7));
        assert_eq!(eval("n + s", &scope).unwrap(), Value::from("3px"));
        assert_eq!(eval("'a' + 1 + 2", &scope).unwrap(), Value::from("a12"));
        assert_eq!(eval("7 % 4", &scope).unwrap(), Value::from(3));
        assert_eq!(eval("1 / 0", &scope).unwrap(), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_comparison() {
        let scope = Scope::from_values([("n", Value::from("10"))]);
        assert_eq!(eval("n > 9", &scope).unwrap(), Value::Bool(true));
        assert_eq!(eval("n == 10", &scope).unwrap(), Value::Bool(true));
        assert_eq!(eval("n === 10", &scope).unwrap(), Value::Bool(false));
        assert_eq!(eval("'b' > 'a'", &scope).unwrap(), Value::Bool(true));
        assert_eq!(eval("n != '10'", &scope).unwrap(), Value::Bool(false));
        assert_eq!(eval("null == 0", &scope).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_logical_returns_deciding_operand() {
        let scope = Scope::from_values([("name", Value::from("")), ("fallback", Value::from("x"))]);
        assert_eq!(eval("name || fallback", &scope).unwrap(), Value::from("x"));
        assert_eq!(eval("name && missing", &scope).unwrap(), Value::from(""));
        assert_eq!(eval("!name", &scope).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_undefined_identifier() {
        let scope = Scope::new();
        assert_eq!(
            eval("missing + 1", &scope).unwrap_err(),
            EvalError::UndefinedIdentifier("missing".to_string())
        );
    }

    #[test]
    fn test_function_modes() {
        let mut scope = Scope::new();
        scope.define_function("double", |args: &[Value]| {
            Ok(Value::Number(args.first().map(Value::as_number).unwrap_or(0.0) * 2.0))
        });
        let expr = parse("double(4)").unwrap();

        let filtered = Evaluator::new(&scope, FunctionMode::Filtered).eval(&expr);
        assert!(matches!(filtered, Err(EvalError::FunctionsDisabled(_))));

        let kept = Evaluator::new(&scope, FunctionMode::Keep).eval(&expr).unwrap();
        assert_eq!(kept, Value::from(8));
    }
}
