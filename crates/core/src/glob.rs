//! Simplified glob matching shared by scanners and searchers.
//!
//! Patterns support `**/`, `**`, `*` and `?` only. Character classes and brace
//! expansion are not supported; those characters match literally. Matching is
//! case-insensitive and anchored to the whole input.

use regex::Regex;

use crate::error::CleanerError;

#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, CleanerError> {
        let source = normalize_separators(pattern);
        let translated = translate(&source);
        let regex = Regex::new(&translated).map_err(|source_err| CleanerError::InvalidGlob {
            pattern: pattern.to_string(),
            source: source_err,
        })?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(&normalize_separators(text))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<GlobPattern>,
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Result<Self, CleanerError> {
        let patterns = patterns
            .iter()
            .map(|pattern| pattern.trim())
            .filter(|pattern| !pattern.is_empty())
            .map(GlobPattern::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }
}

fn translate(pattern: &str) -> String {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*/", "(.+/)?")
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", ".");
    format!("(?i)^{escaped}$")
}

fn normalize_separators(value: &str) -> String {
    value.replace('\\', "/")
}
