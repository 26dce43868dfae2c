//! Pattern Invalidation Module
//!
//! Targets for `TieredCache::invalidate`: one exact key, or every key in
//! either tier matching a regular expression.

use std::collections::HashSet;

use regex::Regex;

use crate::error::Result;

// == Invalidation Target ==
#[derive(Debug, Clone)]
pub enum Invalidation {
    /// Exact key, behaves like `delete`
    Key(String),
    /// Every key the expression matches
    Pattern(Regex),
}

impl Invalidation {
    /// Compiles `pattern` into a pattern target.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Checks whether `key` is covered by this target.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Key(exact) => exact == key,
            Self::Pattern(regex) => regex.is_match(key),
        }
    }
}

impl From<&str> for Invalidation {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Invalidation {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<Regex> for Invalidation {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

// == Matching Keys ==
/// Returns the distinct keys from both tiers that `target` matches.
///
/// Memory keys come first, then durable keys not already seen.
pub fn matching_keys<'a, M, D>(target: &Invalidation, memory_keys: M, durable_keys: D) -> Vec<String>
where
    M: IntoIterator<Item = &'a str>,
    D: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    memory_keys
        .into_iter()
        .chain(durable_keys)
        .filter(|key| target.matches(key))
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}
