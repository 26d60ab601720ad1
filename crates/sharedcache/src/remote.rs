//! Remote (L2) tier: a Redis-backed store behind a fail-open adapter.
//!
//! ## Graceful Degradation
//!
//! The store is built lazily, at most once, from [`RedisConfig`]. Without an
//! endpoint and credential the adapter stays unavailable for its whole
//! lifetime and every operation is a no-op. Once built, every call is bounded
//! by a timeout (tighter for reads than writes); a timeout or client error is
//! logged, counted and turned into "no data". Nothing is ever returned to the
//! caller as an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::config::RedisConfig;
use crate::error::RemoteError;
use crate::metrics;

/// Minimal key/value contract over a distributed store.
///
/// Implementations must tolerate concurrent calls; the adapter adds no
/// locking around them.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Get the string stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError>;

    /// Store `value` at `key`, expiring after `ttl_secs` seconds.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), RemoteError>;

    /// Delete `key`.
    async fn del(&self, key: &str) -> Result<(), RemoteError>;

    /// Round-trip to the store (health checks).
    async fn ping(&self) -> Result<(), RemoteError>;
}

/// [`RemoteStore`] over a deadpool Redis pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool for `url`, authenticating with `token`.
    ///
    /// No connection is opened here; deadpool connects on first checkout.
    pub fn connect(
        url: &str,
        token: &str,
        pool_size: usize,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let url = authenticated_url(url, token)?;

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(timeout);
        timeouts.create = Some(timeout);
        timeouts.recycle = Some(timeout);
        let mut pool_config = PoolConfig::new(pool_size);
        pool_config.timeouts = timeouts;

        let mut redis_config = deadpool_redis::Config::from_url(url);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| RemoteError::OperationFailed(format!("failed to create Redis pool: {e}")))?;
        Ok(Self::new(pool))
    }
}

/// Put `token` into the password slot of `url`.
fn authenticated_url(url: &str, token: &str) -> Result<String, RemoteError> {
    let mut parsed = url::Url::parse(url)
        .map_err(|e| RemoteError::OperationFailed(format!("invalid Redis URL: {e}")))?;
    parsed
        .set_password(Some(token))
        .map_err(|_| RemoteError::OperationFailed("Redis URL cannot carry a credential".into()))?;
    Ok(parsed.into())
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), RemoteError> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), RemoteError> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        let mut conn = self.pool.get().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Fail-open adapter around an optional [`RemoteStore`].
pub struct RemoteTier {
    config: RedisConfig,
    store: OnceCell<Option<Arc<dyn RemoteStore>>>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl RemoteTier {
    /// Adapter that builds a [`RedisStore`] from `config` on first use.
    pub fn from_config(config: RedisConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            config,
            store: OnceCell::new(),
        }
    }

    /// Adapter that is permanently unavailable (local-only mode).
    pub fn disabled() -> Self {
        let config = RedisConfig::default();
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            config,
            store: OnceCell::new_with(Some(None)),
        }
    }

    /// Adapter over an already-built store.
    pub fn with_store(
        store: Arc<dyn RemoteStore>,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            config: RedisConfig::default(),
            store: OnceCell::new_with(Some(Some(store))),
            read_timeout,
            write_timeout,
        }
    }

    async fn store(&self) -> Option<&Arc<dyn RemoteStore>> {
        self.store
            .get_or_init(|| async { Self::build_store(&self.config) })
            .await
            .as_ref()
    }

    fn build_store(config: &RedisConfig) -> Option<Arc<dyn RemoteStore>> {
        let Some((url, token)) = config.credentials() else {
            tracing::info!("Redis endpoint or credential not configured, using local cache only");
            return None;
        };

        match RedisStore::connect(url, token, config.pool_size, config.write_timeout()) {
            Ok(store) => {
                tracing::info!(
                    pool_size = config.pool_size,
                    read_timeout_ms = config.read_timeout_ms,
                    write_timeout_ms = config.write_timeout_ms,
                    "Redis cache tier initialized"
                );
                Some(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to initialize Redis cache tier. Falling back to local cache."
                );
                None
            }
        }
    }

    /// Run `op` against the store within `limit`.
    async fn bounded<'a, T, F, Fut>(&'a self, limit: Duration, op: F) -> Result<T, RemoteError>
    where
        F: FnOnce(&'a Arc<dyn RemoteStore>) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>> + 'a,
    {
        let store = self.store().await.ok_or(RemoteError::Unavailable)?;
        tokio::time::timeout(limit, op(store))
            .await
            .unwrap_or(Err(RemoteError::Timeout(limit)))
    }

    /// GET `key`, surfacing the failure kind.
    pub async fn try_get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        self.bounded(self.read_timeout, |store| store.get(key)).await
    }

    /// SET `key` with expiry, surfacing the failure kind.
    pub async fn try_set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), RemoteError> {
        self.bounded(self.write_timeout, |store| store.set_ex(key, value, ttl_secs))
            .await
    }

    /// DEL `key`, surfacing the failure kind.
    pub async fn try_del(&self, key: &str) -> Result<(), RemoteError> {
        self.bounded(self.write_timeout, |store| store.del(key)).await
    }

    /// GET `key`. Any failure is a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                absorb("get", key, &e);
                None
            }
        }
    }

    /// SET `key`. Failures are logged and skipped.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        match self.try_set(key, value, ttl_secs).await {
            Ok(()) => tracing::debug!(key = %key, ttl_secs, "cache set (L2)"),
            Err(e) => absorb("set", key, &e),
        }
    }

    /// DEL `key`. Failures are logged and skipped.
    pub async fn del(&self, key: &str) {
        if let Err(e) = self.try_del(key).await {
            absorb("del", key, &e);
        }
    }

    /// Check if the remote store answers within the read timeout (for health checks).
    pub async fn is_available(&self) -> bool {
        self.bounded(self.read_timeout, |store| store.ping())
            .await
            .is_ok()
    }

    /// "redis" when a store is configured, "local" otherwise.
    pub async fn mode(&self) -> &'static str {
        if self.store().await.is_some() {
            "redis"
        } else {
            "local"
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }
}

fn absorb(op: &'static str, key: &str, err: &RemoteError) {
    match err {
        RemoteError::Unavailable => {
            tracing::debug!(key = %key, op, "Redis tier unavailable, skipping");
        }
        RemoteError::Timeout(limit) => {
            tracing::warn!(key = %key, op, timeout_ms = limit.as_millis() as u64, "Redis operation timed out");
            metrics::record_remote_error(op, err.kind());
        }
        RemoteError::OperationFailed(e) => {
            tracing::warn!(key = %key, op, error = %e, "Redis operation failed");
            metrics::record_remote_error(op, err.kind());
        }
    }
}
