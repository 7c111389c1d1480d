// ABOUTME: Capture-replace engine for state embedded in classes, attributes and styles
// ABOUTME: Extracts, splices or synthesizes the first capture group of a pattern

pub mod capture;
pub mod error;
pub mod synthesize;

pub use capture::CapturePattern;
pub use error::{PatternError, Result};
pub use synthesize::synthesize_from_pattern;

/// First capture group of `pattern` in `subject`, if the pattern matches and the
/// group took part in the match.
pub fn extract_first_group(pattern: &str, subject: &str) -> Result<Option<String>> {
    Ok(CapturePattern::new(pattern)?.extract_first_group(subject))
}

/// `subject` with only the first capture group's span replaced by `replacement`.
/// `None` when there is no span to replace.
pub fn splice_first_group(pattern: &str, subject: &str, replacement: &str) -> Result<Option<String>> {
    Ok(CapturePattern::new(pattern)?.splice_first_group(subject, replacement))
}
