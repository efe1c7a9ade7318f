/*!
 * Sampling Tokens
 * Parsed `SEVERITY[:pattern]` rules, validated once at load time
 */

use crate::core::severity::{ParseSeverityError, Severity};
use regex::Regex;
use thiserror::Error;

/// One key's parsed sampling rule. A token without a pattern matches on
/// severity alone; a token with a pattern additionally requires the whole
/// candidate value to match.
#[derive(Debug, Clone)]
pub struct Token {
    key: String,
    raw: String,
    threshold: Severity,
    pattern: Option<Regex>,
}

#[derive(Error, Debug, Clone)]
pub enum TokenParseError {
    #[error("empty rule text")]
    EmptyRule,
    #[error(transparent)]
    BadSeverity(#[from] ParseSeverityError),
    #[error("invalid value pattern: {0}")]
    BadPattern(String),
}

impl Token {
    /// Parse rule text of the form `SEVERITY` or `SEVERITY:pattern`.
    /// The severity name is case-insensitive; the pattern must match the
    /// candidate value in full.
    pub fn parse(key: impl Into<String>, raw: &str) -> Result<Self, TokenParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TokenParseError::EmptyRule);
        }
        // split on the first colon only when a severity precedes it
        let (threshold, pattern) = match trimmed.split_once(':') {
            Some((sev, pat)) if !sev.is_empty() => {
                let threshold: Severity = sev.parse()?;
                let pattern = full_match_regex(pat)
                    .map_err(|e| TokenParseError::BadPattern(e.to_string()))?;
                (threshold, Some(pattern))
            }
            _ => (trimmed.parse()?, None),
        };
        Ok(Self {
            key: key.into(),
            raw: raw.to_string(),
            threshold,
            pattern,
        })
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The unparsed rule text this token was built from
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    #[inline]
    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Decide whether `severity` (and optionally `value`) is enabled under
    /// this token. An omitted value skips the pattern check entirely.
    pub fn matches(&self, severity: Severity, value: Option<&str>) -> bool {
        if severity < self.threshold {
            return false;
        }
        match (value, &self.pattern) {
            (Some(value), Some(pattern)) => pattern.is_match(value),
            _ => true,
        }
    }
}

/// Compile a pattern that must cover the whole candidate string
pub(crate) fn full_match_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}
