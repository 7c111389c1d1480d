// ABOUTME: Error types for widget definition loading, validation and editing sessions
// ABOUTME: Chains template and expression errors and carries structured validation failures

use thiserror::Error;

use crate::expr::EvalError;
use crate::template::RenderError;

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Failed to read widget file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Condition failed: {0}")]
    Eval(#[from] EvalError),

    #[error("Validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate parameter name: {parameter}")]
    DuplicateParameter { parameter: String },

    #[error("Invalid template syntax: {error}")]
    InvalidTemplate { error: String },

    #[error("Invalid binding '{binding}' on parameter '{parameter}': {reason}")]
    InvalidBinding {
        parameter: String,
        binding: String,
        reason: String,
    },

    #[error("Invalid 'when' condition on parameter '{parameter}': {error}")]
    InvalidCondition { parameter: String, error: String },

    #[error("Unknown transform '{transform}' on parameter '{parameter}'")]
    UnknownTransform { parameter: String, transform: String },

    #[error("Template variable '{variable}' is not a declared parameter")]
    UndeclaredVariable { variable: String },

    #[error("Invalid widget selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

pub type Result<T> = std::result::Result<T, WidgetError>;
