//! Error types for the shared cache layer.
//!
//! Only [`SharedCacheError::LoaderFailed`] (and, for unencodable loader
//! results, [`SharedCacheError::SerializationFailed`]) ever reaches a caller.
//! Every other kind is absorbed at the tier boundary and turned into a miss.

use std::sync::Arc;
use std::time::Duration;

/// Errors produced by the remote (L2) store.
///
/// These never escape [`crate::RemoteTier`]; they exist so that the adapter
/// can log and count failures by kind before degrading to "no data".
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// The remote tier was never configured (or its configuration is unusable).
    #[error("remote tier unavailable")]
    Unavailable,

    /// The operation did not complete within its bound.
    #[error("remote operation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other failure reported by the client.
    #[error("remote operation failed: {0}")]
    OperationFailed(String),
}

impl RemoteError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Unavailable => "unavailable",
            RemoteError::Timeout(_) => "timeout",
            RemoteError::OperationFailed(_) => "operation_failed",
        }
    }
}

impl From<redis::RedisError> for RemoteError {
    fn from(e: redis::RedisError) -> Self {
        RemoteError::OperationFailed(e.to_string())
    }
}

impl From<deadpool_redis::PoolError> for RemoteError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        RemoteError::OperationFailed(format!("failed to get Redis connection: {e}"))
    }
}

/// Errors of the shared cache layer.
///
/// The type is `Clone` because a single loader failure is fanned out to every
/// caller waiting on the same in-flight computation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SharedCacheError {
    /// The remote tier was never configured.
    #[error("remote cache unavailable")]
    RemoteUnavailable,

    /// A remote operation exceeded its timeout.
    #[error("remote cache timed out after {0:?}")]
    RemoteTimeout(Duration),

    /// A remote operation failed for any other reason.
    #[error("remote cache operation failed: {0}")]
    RemoteOperationFailed(String),

    /// A cached string could not be decoded into the requested type.
    #[error("failed to deserialize cached value: {0}")]
    DeserializationFailed(String),

    /// A value could not be encoded for caching.
    #[error("failed to serialize value for cache: {0}")]
    SerializationFailed(String),

    /// The loader passed to `get_or_set` returned an error.
    #[error("cache loader failed: {0:#}")]
    LoaderFailed(Arc<anyhow::Error>),
}

impl SharedCacheError {
    /// Wraps a loader error so it can be shared by every waiter.
    pub fn loader(err: impl Into<anyhow::Error>) -> Self {
        Self::LoaderFailed(Arc::new(err.into()))
    }

    /// Returns `true` if this error came from the caller-supplied loader.
    pub fn is_loader_failure(&self) -> bool {
        matches!(self, Self::LoaderFailed(_))
    }
}

impl From<RemoteError> for SharedCacheError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Unavailable => Self::RemoteUnavailable,
            RemoteError::Timeout(d) => Self::RemoteTimeout(d),
            RemoteError::OperationFailed(msg) => Self::RemoteOperationFailed(msg),
        }
    }
}

/// Result type for shared cache operations.
pub type Result<T, E = SharedCacheError> = std::result::Result<T, E>;
