//! Redirect pairs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::url::{DocUrl, RedirectTarget};
use crate::normalize::UrlError;

/// A single redirect: `from` has moved to `to`.
///
/// Implements `Ord` for deterministic ordering: (from, to), compared as
/// plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectPair {
    /// The retired document URL.
    pub from: DocUrl,
    /// Where it now lives.
    pub to: RedirectTarget,
}

impl RedirectPair {
    /// Create a new pair.
    pub fn new(from: DocUrl, to: RedirectTarget) -> Self {
        Self { from, to }
    }

    /// Parse and canonicalize both ends of a pair.
    pub fn parse(from: &str, to: &str) -> Result<Self, UrlError> {
        Ok(Self::new(DocUrl::parse(from)?, RedirectTarget::parse(to)?))
    }

    /// Case-folded key of the source.
    pub fn key(&self) -> String {
        self.from.key()
    }
}

impl fmt::Display for RedirectPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.from, self.to)
    }
}

// Canonical ordering: from, then to
impl PartialOrd for RedirectPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RedirectPair {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.from.as_str().cmp(other.from.as_str()) {
            Ordering::Equal => self.to.as_str().cmp(other.to.as_str()),
            ord => ord,
        }
    }
}
