// ABOUTME: Compiled capture pattern with extract and splice-by-offset operations
// ABOUTME: Splices only the first group's span so surrounding text is preserved byte for byte

use regex::Regex;

use super::error::{PatternError, Result};
use super::synthesize::synthesize_from_pattern;

#[derive(Debug, Clone)]
pub struct CapturePattern {
    source: String,
    regex: Regex,
}

impl CapturePattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| PatternError::InvalidPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }

    pub fn extract_first_group(&self, subject: &str) -> Option<String> {
        self.regex
            .captures(subject)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn splice_first_group(&self, subject: &str, replacement: &str) -> Option<String> {
        let caps = self.regex.captures(subject)?;
        let group = caps.get(1)?;

        let mut spliced =
            String::with_capacity(subject.len() - group.len() + replacement.len());
        spliced.push_str(&subject[..group.start()]);
        spliced.push_str(replacement);
        spliced.push_str(&subject[group.end()..]);
        Some(spliced)
    }

    pub fn synthesize(&self, replacement: &str) -> String {
        synthesize_from_pattern(&self.source, replacement)
    }

    /// Splice into `subject` when possible, otherwise build a fresh string from
    /// the pattern itself. A match whose first group did not participate
    /// counts as "no span" and is synthesized too.
    pub fn replace_or_synthesize(&self, subject: &str, replacement: &str) -> String {
        self.splice_first_group(subject, replacement)
            .unwrap_or_else(|| self.synthesize(replacement))
    }
}
