//! Exempt path matching
//!
//! Rules and candidate paths are compared with a single trailing `/`
//! appended, so `/api/v1/status` and `/api/v1/status/` are the same route.
//! A rule ending in `*` exempts every path that starts with the text before
//! the `*`; any other rule exempts only its own normalized path.

use std::fmt;

/// One exempt-path rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pattern: String,
    kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleKind {
    Exact(String),
    Prefix(String),
    Never,
}

impl PathRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let trimmed = pattern.trim();

        let kind = if trimmed.is_empty() {
            RuleKind::Never
        } else {
            let body = trimmed.strip_suffix('/').unwrap_or(trimmed);
            match body.strip_suffix('*') {
                Some(prefix) => RuleKind::Prefix(prefix.to_string()),
                None => RuleKind::Exact(normalize(trimmed)),
            }
        };

        Self { pattern, kind }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, RuleKind::Prefix(_))
    }

    /// Whether this rule exempts `path`
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match &self.kind {
            RuleKind::Exact(rule) => *rule == path,
            RuleKind::Prefix(prefix) => path.starts_with(prefix.as_str()),
            RuleKind::Never => false,
        }
    }
}

impl fmt::Display for PathRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl From<&str> for PathRule {
    fn from(pattern: &str) -> Self {
        PathRule::new(pattern)
    }
}

impl From<String> for PathRule {
    fn from(pattern: String) -> Self {
        PathRule::new(pattern)
    }
}

/// Append a trailing `/` when absent
fn normalize(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Decide whether `path` needs an identity.
///
/// An empty path, or an empty rule set, always requires authentication.
pub fn requires_auth(path: &str, exempt: &[PathRule]) -> bool {
    if path.is_empty() || exempt.is_empty() {
        return true;
    }
    !exempt.iter().any(|rule| rule.matches(path))
}

/// A fixed set of exempt path rules
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    rules: Vec<PathRule>,
}

impl PathMatcher {
    pub fn new<I, R>(rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<PathRule>,
    {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    pub fn requires_auth(&self, path: &str) -> bool {
        requires_auth(path, &self.rules)
    }
}
