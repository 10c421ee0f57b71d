//! Date-coded version identifiers.
//!
//! A version is a fixed-width `YYYY-MM-DD` string. Ordering is plain
//! lexicographic string ordering, which matches chronological ordering only
//! because every real identifier has the same width. Values coming from
//! outside the registry (store, config) go through [`VersionId::parse`] so the
//! fixed-width assumption holds everywhere.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VersionError;

const DATE_PATTERN: &str = r"\d{4}-\d{2}-\d{2}";

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is a valid regex"))
}

fn exact_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", DATE_PATTERN)).expect("date pattern is a valid regex")
    })
}

/// A migration version identifier. The empty value means "no version" and
/// sorts before every real version.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId(String);

impl VersionId {
    /// The absent version.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Parse a stored or configured version.
    ///
    /// Accepts the empty string (absent) or an exact `YYYY-MM-DD` value.
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        if value.is_empty() || exact_date_regex().is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(VersionError::Malformed(value.to_string()))
        }
    }

    /// Extract the version embedded in a unit's identifying name.
    ///
    /// Returns the first date-shaped substring, or the empty version when the
    /// name carries none.
    pub fn from_unit_name(name: &str) -> Self {
        date_regex()
            .find(name)
            .map(|m| Self(m.as_str().to_string()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` sorts strictly after `baseline`.
    pub fn is_newer_than(&self, baseline: &VersionId) -> bool {
        is_newer_than(self, baseline)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers line up in tables
        if self.0.is_empty() {
            f.pad("(none)")
        } else {
            f.pad(&self.0)
        }
    }
}

/// Compare two versions lexicographically.
pub fn compare(a: &VersionId, b: &VersionId) -> Ordering {
    a.0.cmp(&b.0)
}

/// True if `candidate` is strictly newer than `baseline`.
pub fn is_newer_than(candidate: &VersionId, baseline: &VersionId) -> bool {
    compare(candidate, baseline) == Ordering::Greater
}
