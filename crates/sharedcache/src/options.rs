//! Per-write TTL and options.

use std::time::Duration;

/// Time-to-live of a cached value, in milliseconds.
///
/// The local tier uses the millisecond value directly; Redis expresses expiry
/// in whole seconds, see [`Ttl::remote_secs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u64);

impl Ttl {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// TTL for the local tier. A zero TTL becomes 1ms (immediately stale).
    pub fn as_duration(&self) -> Duration {
        if self.0 == 0 {
            tracing::debug!("zero TTL clamped to 1ms");
        }
        Duration::from_millis(self.0.max(1))
    }

    /// TTL for the remote tier: whole seconds, rounded up, at least 1.
    pub const fn remote_secs(&self) -> u64 {
        let secs = self.0.div_ceil(1000);
        if secs == 0 { 1 } else { secs }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Options accepted by `set` and `get_or_set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Bound on the local tier's entry count after this write.
    /// `None` uses the configured default.
    pub max_entries: Option<usize>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Resolve the effective bound. Never less than 1 so a process can always
    /// read its own write.
    pub(crate) fn resolve_max_entries(&self, default: usize) -> usize {
        self.max_entries.unwrap_or(default).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_secs_rounds_up() {
        assert_eq!(Ttl::from_millis(1000).remote_secs(), 1);
        assert_eq!(Ttl::from_millis(1001).remote_secs(), 2);
        assert_eq!(Ttl::from_millis(2500).remote_secs(), 3);
        assert_eq!(Ttl::from_secs(60).remote_secs(), 60);
    }

    #[test]
    fn test_remote_secs_minimum_one() {
        assert_eq!(Ttl::from_millis(0).remote_secs(), 1);
        assert_eq!(Ttl::from_millis(1).remote_secs(), 1);
        assert_eq!(Ttl::from_millis(999).remote_secs(), 1);
    }

    #[test]
    fn test_local_duration() {
        assert_eq!(Ttl::from_millis(250).as_duration(), Duration::from_millis(250));
        assert_eq!(Ttl::from_millis(0).as_duration(), Duration::from_millis(1));
        assert_eq!(Ttl::from(Duration::from_secs(2)).as_millis(), 2000);
    }

    #[test]
    fn test_max_entries_resolution() {
        assert_eq!(SetOptions::new().resolve_max_entries(100), 100);
        assert_eq!(SetOptions::new().with_max_entries(5).resolve_max_entries(100), 5);
        assert_eq!(SetOptions::new().with_max_entries(0).resolve_max_entries(100), 1);
    }
}
