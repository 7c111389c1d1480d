// ABOUTME: Error types for the capture-replace engine
// ABOUTME: Wraps regex compilation failures with the offending pattern

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type Result<T> = std::result::Result<T, PatternError>;
