//! Path predicates.
//!
//! # Responsibilities
//! - Decide whether a request path belongs to a route
//! - Decide whether one predicate covers every path another one matches
//!
//! # Design Decisions
//! - Routes are data (`MatchKind`), not closures
//! - Exact matching is ASCII case-insensitive
//! - Prefix matching is case-sensitive
//! - Pure functions of the path string; no regex

use serde::{Deserialize, Serialize};

/// How a route's path is compared with the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "path", rename_all = "snake_case")]
pub enum MatchKind {
    /// The whole path equals this one, ignoring ASCII case.
    Exact(String),
    /// The path starts with this prefix.
    Prefix(String),
}

impl MatchKind {
    /// Returns true if `path` is matched.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            MatchKind::Exact(expected) => path.eq_ignore_ascii_case(expected),
            MatchKind::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }

    /// Returns true if every path matched by `other` is also matched by `self`.
    pub fn covers(&self, other: &MatchKind) -> bool {
        match (self, other) {
            (MatchKind::Prefix(p), MatchKind::Prefix(q)) => q.starts_with(p.as_str()),
            (MatchKind::Exact(e), MatchKind::Exact(f)) => e.eq_ignore_ascii_case(f),
            // An exact route matches every case variant of its path, so a
            // prefix covers it only when no letter in the prefix can vary.
            (MatchKind::Prefix(p), MatchKind::Exact(e)) => {
                e.len() >= p.len()
                    && e.as_bytes()[..p.len()].eq_ignore_ascii_case(p.as_bytes())
                    && !p.bytes().any(|b| b.is_ascii_alphabetic())
            }
            (MatchKind::Exact(_), MatchKind::Prefix(_)) => false,
        }
    }

    /// The configured path or prefix.
    pub fn path(&self) -> &str {
        match self {
            MatchKind::Exact(p) | MatchKind::Prefix(p) => p,
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact(p) => write!(f, "exact {}", p),
            MatchKind::Prefix(p) => write!(f, "prefix {}", p),
        }
    }
}
