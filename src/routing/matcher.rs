//! Path prefix matching.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive, literal)
//! - Report the unmatched remainder of the path
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Literal byte prefix, no segment-boundary rule: `/api/member` matches `/api/members`
//! - No regex to guarantee O(n) matching

/// Matches the request path against a literal prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Length used to rank competing matches.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    /// Returns the remainder of `path` after the prefix, or `None` if it does not match.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }
}
