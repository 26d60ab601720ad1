//! Two-tier shared cache for memoizing expensive lookups across requests and
//! server instances.
//!
//! ## Architecture
//!
//! - **L1 (local)**: In-memory, per-process, TTL + entry-count bound (FIFO eviction)
//! - **L2 (Redis)**: Network, shared across processes, bounded by timeouts
//! - **In-flight registry**: One loader run per key per process on a cold miss
//!
//! ## Cache Hierarchy
//!
//! ```text
//! get → L1 → L2 → miss
//!        ↓     ↓
//!      <1µs  ~ms, promoted into L1
//! ```
//!
//! ## Graceful Degradation
//!
//! If Redis is unconfigured, unreachable or slow, the cache keeps working as
//! a local-only cache. Remote failures never reach callers; the only error a
//! caller can see is its own loader failing in [`SharedCache::get_or_set`].
//!
//! ## Example
//!
//! ```ignore
//! use sharedcache::{SetOptions, SharedCache, SharedCacheConfig, Ttl};
//!
//! let cache = SharedCache::new(&SharedCacheConfig::default());
//! let id = tenant_id.to_string();
//! let ctx: TenantContext = cache
//!     .get_or_set("tenant-context", tenant_id, Ttl::from_secs(30), move || async move {
//!         load_tenant_context(&id).await
//!     }, SetOptions::new())
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod local;
pub mod metrics;
pub mod observability;
pub mod options;
pub mod remote;
pub mod service;
pub mod singleflight;

pub use config::{LocalConfig, LoggingConfig, RedisConfig, SharedCacheConfig};
pub use error::{RemoteError, Result, SharedCacheError};
pub use key::CacheKey;
pub use local::{CacheEntry, LocalTier};
pub use observability::init_tracing_with_level;
pub use options::{SetOptions, Ttl};
pub use remote::{RedisStore, RemoteStore, RemoteTier};
pub use service::{CacheStats, SharedCache};
pub use singleflight::InFlight;
