//! Cache-aside orchestration over the local and remote tiers.
//!
//! ## Lookup Order
//!
//! ```text
//! get        → L1 (local) → L2 (Redis) → miss
//!                              ↓ hit
//!                      promote into L1 (short TTL)
//!
//! set        → L1 (sync) → L2 (bounded, failures ignored)
//!
//! get_or_set → get → in-flight? join : run loader once → set → deregister
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{LocalConfig, SharedCacheConfig};
use crate::error::{Result, SharedCacheError};
use crate::key::CacheKey;
use crate::local::LocalTier;
use crate::metrics;
use crate::options::{SetOptions, Ttl};
use crate::remote::RemoteTier;
use crate::singleflight::InFlight;

/// Two-tier shared cache.
///
/// Cloning is cheap; clones share both tiers and the in-flight registry.
#[derive(Clone)]
pub struct SharedCache {
    inner: Arc<Inner>,
}

struct Inner {
    local: LocalTier,
    remote: RemoteTier,
    in_flight: InFlight,
    default_max_entries: usize,
    promotion_ttl: Duration,
}

impl SharedCache {
    /// Create a cache from configuration. Redis is connected lazily.
    pub fn new(config: &SharedCacheConfig) -> Self {
        Self::with_remote(RemoteTier::from_config(config.redis.clone()), &config.local)
    }

    /// Create a local-only cache with default tunables.
    pub fn new_local() -> Self {
        Self::with_remote(RemoteTier::disabled(), &LocalConfig::default())
    }

    /// Create a cache over an existing remote adapter.
    pub fn with_remote(remote: RemoteTier, local: &LocalConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                local: LocalTier::new(),
                remote,
                in_flight: InFlight::new(),
                default_max_entries: local.max_entries.max(1),
                promotion_ttl: local.promotion_ttl(),
            }),
        }
    }

    /// Get a value.
    ///
    /// Returns `None` on a miss in both tiers, on any remote failure, and when
    /// the cached string does not decode into `T`.
    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let key = CacheKey::new(namespace, key).render();

        // 1. L1
        if let Some(raw) = self.inner.local.get(&key) {
            return match decode::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key = %key, "cache hit (L1)");
                    metrics::record_cache_hit("L1");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to deserialize cached value");
                    metrics::record_cache_miss();
                    None
                }
            };
        }

        // 2. L2
        let Some(raw) = self.inner.remote.get(&key).await else {
            tracing::debug!(key = %key, "cache miss");
            metrics::record_cache_miss();
            return None;
        };

        match decode::<T>(&raw) {
            Ok(value) => {
                tracing::debug!(key = %key, "cache hit (L2)");
                metrics::record_cache_hit("L2");
                self.promote(&key, Arc::from(raw));
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize value from Redis");
                metrics::record_cache_miss();
                None
            }
        }
    }

    /// Set a value in both tiers.
    ///
    /// The local write happens first, so this process sees its own write even
    /// if Redis is down. Never fails; an unencodable value is logged and
    /// skipped.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: impl Into<Ttl>,
        options: SetOptions,
    ) {
        let key = CacheKey::new(namespace, key).render();
        match encode(value) {
            Ok(raw) => self.inner.write(&key, raw, ttl.into(), options).await,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize value for cache");
            }
        }
    }

    /// Get a value, computing it with `loader` on a miss.
    ///
    /// Concurrent calls for the same key in this process share one loader
    /// run and its outcome. A loader error or panic is returned to every
    /// waiter and nothing is cached. `loader` runs on its own task.
    pub async fn get_or_set<T, F, Fut, E>(
        &self,
        namespace: &str,
        key: &str,
        ttl: impl Into<Ttl>,
        loader: F,
        options: SetOptions,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        if let Some(value) = self.get::<T>(namespace, key).await {
            return Ok(value);
        }

        let key = CacheKey::new(namespace, key).render();
        let ttl = ttl.into();
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let flight = self.inner.in_flight.join_or_start(&key, move || {
            let key = task_key;
            let load = loader();
            async move {
                metrics::record_loader_invocation();
                tracing::debug!(key = %key, "running cache loader");
                let value = load.await.map_err(|e| {
                    metrics::record_loader_failure();
                    let err = SharedCacheError::loader(e);
                    tracing::debug!(key = %key, error = %err, "cache loader failed");
                    err
                })?;
                let raw = encode(&value)?;
                inner.write(&key, Arc::clone(&raw), ttl, options).await;
                Ok::<_, SharedCacheError>(raw)
            }
        });

        if flight.is_joined() {
            tracing::debug!(key = %key, "joined in-flight computation");
            metrics::record_in_flight_join();
        }

        let raw = flight.into_computation().await?;
        decode(&raw)
    }

    /// Remove a value from both tiers.
    ///
    /// Other processes keep their local copies until those expire.
    pub async fn delete(&self, namespace: &str, key: &str) {
        let key = CacheKey::new(namespace, key).render();
        self.inner.local.remove(&key);
        metrics::set_local_entries(self.inner.local.len());
        self.inner.remote.del(&key).await;
        tracing::debug!(key = %key, "cache invalidated (L1+L2)");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            local_entries: self.inner.local.len(),
            in_flight: self.inner.in_flight.len(),
            mode: self.inner.remote.mode().await.to_string(),
        }
    }

    /// Check if Redis is reachable (for health checks).
    pub async fn is_remote_available(&self) -> bool {
        self.inner.remote.is_available().await
    }

    /// The local tier (for testing/internal use).
    pub fn local(&self) -> &LocalTier {
        &self.inner.local
    }

    /// The in-flight registry (for testing/internal use).
    pub fn in_flight(&self) -> &InFlight {
        &self.inner.in_flight
    }

    fn promote(&self, key: &str, raw: Arc<str>) {
        let outcome = self.inner.local.set(
            key,
            raw,
            self.inner.promotion_ttl,
            self.inner.default_max_entries,
        );
        metrics::record_promotion();
        record_local_write(&self.inner.local, outcome);
    }
}

impl Inner {
    /// Write-through: L1 synchronously, then L2.
    async fn write(&self, key: &str, raw: Arc<str>, ttl: Ttl, options: SetOptions) {
        let max_entries = options.resolve_max_entries(self.default_max_entries);
        let outcome = self
            .local
            .set(key, Arc::clone(&raw), ttl.as_duration(), max_entries);
        record_local_write(&self.local, outcome);
        tracing::debug!(key = %key, ttl_ms = ttl.as_millis(), "cache set (L1)");

        self.remote.set(key, &raw, ttl.remote_secs()).await;
    }
}

fn record_local_write(local: &LocalTier, outcome: crate::local::InsertOutcome) {
    metrics::record_evictions("expired", outcome.expired);
    metrics::record_evictions("capacity", outcome.evicted);
    metrics::set_local_entries(local.len());
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Arc<str>> {
    serde_json::to_string(value)
        .map(Arc::from)
        .map_err(|e| SharedCacheError::SerializationFailed(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| SharedCacheError::DeserializationFailed(e.to_string()))
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Entries in the local tier, including expired ones not yet swept.
    pub local_entries: usize,
    /// Keys with a loader currently running.
    pub in_flight: usize,
    /// "redis" or "local".
    pub mode: String,
}
