//! Namespaced cache keys.
//!
//! ## Key Format
//!
//! `{namespace}:{key}` — e.g. `tenant-context:acme`
//!
//! The rendered form is used verbatim for the local map, the in-flight
//! registry and Redis. Namespaces should not contain `:`; this is not
//! enforced.

use std::fmt;

/// A `(namespace, key)` pair identifying one cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    key: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Render the key as stored in both tiers.
    #[inline]
    pub fn render(&self) -> String {
        format!("{}:{}", self.namespace, self.key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}
