// ABOUTME: Error types for binding construction
// ABOUTME: Covers DSL syntax, unknown kinds, bad arguments and invalid patterns or accessors

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BindingError {
    #[error("Malformed binding '{spec}': {message}")]
    Parse { spec: String, message: String },

    #[error("Unknown binding kind: {0}")]
    UnknownKind(String),

    #[error("Binding {kind}() requires argument {index}: {expected}")]
    MissingArgument {
        kind: String,
        index: usize,
        expected: String,
    },

    #[error("Invalid binding argument for {kind}(): {reason}")]
    InvalidArgument { kind: String, reason: String },

    #[error("Pattern error: {0}")]
    Pattern(#[from] crate::pattern::PatternError),

    #[error("Accessor expression error: {0}")]
    Accessor(#[from] crate::expr::EvalError),
}

pub type Result<T> = std::result::Result<T, BindingError>;
