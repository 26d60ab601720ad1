//! Test doubles for the remote tier.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sharedcache::{LocalConfig, RemoteError, RemoteStore, RemoteTier, SharedCache};

pub const READ_TIMEOUT: Duration = Duration::from_millis(50);
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(80);

/// In-memory stand-in for Redis that counts every call.
#[derive(Default)]
pub struct CountingStore {
    data: Mutex<HashMap<String, (String, u64)>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub dels: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl_secs(&self, key: &str) -> Option<u64> {
        self.data.lock().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.data
            .lock()
            .insert(key.to_string(), (value.to_string(), 60));
    }
}

#[async_trait]
impl RemoteStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.raw(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), RemoteError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.data
            .lock()
            .insert(key.to_string(), (value.to_string(), ttl_secs));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), RemoteError> {
        self.dels.fetch_add(1, Ordering::SeqCst);
        self.data.lock().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Store whose every call fails.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

impl FailingStore {
    fn fail<T>(&self) -> Result<T, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::OperationFailed("connection reset by peer".into()))
    }
}

#[async_trait]
impl RemoteStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, RemoteError> {
        self.fail()
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), RemoteError> {
        self.fail()
    }

    async fn del(&self, _key: &str) -> Result<(), RemoteError> {
        self.fail()
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.fail()
    }
}

/// Store that never answers.
#[derive(Default)]
pub struct HangingStore;

#[async_trait]
impl RemoteStore for HangingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, RemoteError> {
        std::future::pending().await
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), RemoteError> {
        std::future::pending().await
    }

    async fn del(&self, _key: &str) -> Result<(), RemoteError> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        std::future::pending().await
    }
}

/// A cache over `store`, standing in for one server process.
pub fn cache_with(store: Arc<dyn RemoteStore>) -> SharedCache {
    cache_with_local(store, LocalConfig::default())
}

pub fn cache_with_local(store: Arc<dyn RemoteStore>, local: LocalConfig) -> SharedCache {
    SharedCache::with_remote(
        RemoteTier::with_store(store, READ_TIMEOUT, WRITE_TIMEOUT),
        &local,
    )
}
