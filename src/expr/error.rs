// ABOUTME: Error types for expression compilation and evaluation
// ABOUTME: Distinguishes syntax errors, unknown identifiers and disabled function calls

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Syntax error at offset {offset} in '{expr}': {message}")]
    Syntax {
        expr: String,
        offset: usize,
        message: String,
    },

    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    #[error("Function calls are not allowed in this expression: {0}()")]
    FunctionsDisabled(String),

    #[error("Unknown function: {0}()")]
    UnknownFunction(String),

    #[error("Invalid arguments for {function}(): {reason}")]
    InvalidArguments { function: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EvalError>;
