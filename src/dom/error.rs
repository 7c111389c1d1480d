// ABOUTME: Error types for the in-memory DOM
// ABOUTME: Covers selector syntax and HTML fragment parsing failures

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("HTML parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, DomError>;
