//! Cache key definitions.
//!
//! Defines `Region` (disjoint namespaces) and `CacheKey` (operation + params).

use std::fmt;

/// Disjoint cache namespace. A region only ever holds one value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Full record listing.
    Records,
    /// Single record by identifier.
    RecordsById,
    /// Records filtered by owner.
    RecordsByOwner,
    /// Untyped JSON passthrough of arbitrary content-API resources.
    Generic,
    /// Generated text keyed by prompt digest.
    Completions,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Records => "records",
            Region::RecordsById => "records-by-id",
            Region::RecordsByOwner => "records-by-owner",
            Region::Generic => "generic",
            Region::Completions => "completions",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic key built from an operation name and ordered parameters.
///
/// Each parameter is length-prefixed, so `("a|b")` and `("a", "b")` never
/// collide, and two operations never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(operation: &str) -> Self {
        Self(format!("{}:{operation}", operation.len()))
    }

    pub fn param(mut self, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        self.0.push('|');
        self.0.push_str(&value.len().to_string());
        self.0.push(':');
        self.0.push_str(&value);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully-qualified key for backends with a single flat keyspace.
    pub fn qualified(&self, region: Region) -> String {
        format!("relaydoc::{}::{}", region.as_str(), self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
