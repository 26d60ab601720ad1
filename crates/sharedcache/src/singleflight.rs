//! In-flight registry for `get_or_set`.
//!
//! One entry per namespaced key while its loader runs. Callers that miss the
//! cache while an entry exists attach to it instead of running their own
//! loader, and all of them receive the same serialized value or the same
//! error.
//!
//! The computation runs on its own task, so a caller that gives up (its
//! request is cancelled) does not cancel the loader for everyone else. The
//! entry is removed when that task ends, whether the loader succeeded, failed
//! or panicked.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::SharedCacheError;

/// Result fanned out to every waiter: the serialized value.
pub type FlightResult = Result<Arc<str>, SharedCacheError>;

/// A computation that any number of callers can await.
pub type Computation = Shared<BoxFuture<'static, FlightResult>>;

/// How a caller got hold of a [`Computation`].
pub enum Flight {
    /// This caller registered the computation; its loader is running.
    Started(Computation),
    /// Another caller's computation was already running.
    Joined(Computation),
}

impl Flight {
    pub fn is_joined(&self) -> bool {
        matches!(self, Flight::Joined(_))
    }

    pub fn into_computation(self) -> Computation {
        match self {
            Flight::Started(c) | Flight::Joined(c) => c,
        }
    }
}

/// Process-wide map from namespaced key to its running computation.
#[derive(Clone, Default)]
pub struct InFlight {
    pending: Arc<DashMap<String, Computation>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the computation for `key`, or register and spawn the one
    /// built by `compute`.
    ///
    /// `compute` is only called on the spawned task, after the registry lock
    /// for `key` is released, so it may panic or consult the registry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: &str, compute: F) -> Flight
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FlightResult> + Send + 'static,
    {
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => Flight::Joined(entry.get().clone()),
            Entry::Vacant(entry) => {
                let guard = Deregister {
                    pending: Arc::clone(&self.pending),
                    key: key.to_string(),
                };
                // On a multi-thread runtime the task may start before the
                // insert below; Deregister::drop then waits for the shard.
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    compute().await
                });
                let computation = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(SharedCacheError::loader(anyhow::anyhow!(
                            "cache computation did not complete: {e}"
                        ))),
                    }
                }
                .boxed()
                .shared();
                entry.insert(computation.clone());
                Flight::Started(computation)
            }
        }
    }

    /// Whether a computation for `key` is running.
    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Removes the registry entry when the computation task ends.
struct Deregister {
    pending: Arc<DashMap<String, Computation>>,
    key: String,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}
