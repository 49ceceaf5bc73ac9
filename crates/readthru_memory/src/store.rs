// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache store implementation using moka.

use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::{Expiry, future::Cache};
use readthru_store::{CacheEntry, CacheStore, QueryKey, StoreError};

use crate::builder::InMemoryStoreBuilder;

/// An in-memory cache store backed by moka.
///
/// Entries are evicted by moka once their TTL elapses, and every read checks the entry's
/// expiration instant as well, so an expired value is never returned even before eviction
/// catches up. Clones share the same underlying cache.
///
/// # Examples
///
/// ```
/// use readthru_memory::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let bounded = InMemoryStore::with_capacity(1000);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Cache<QueryKey, CacheEntry>,
}

/// Tells moka to drop each entry when its own TTL runs out.
struct EntryExpiry;

impl Expiry<QueryKey, CacheEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &QueryKey, value: &CacheEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &QueryKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory store holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory store.
    #[must_use]
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryStoreBuilder) -> Self {
        let mut moka_builder = Cache::builder().expire_after(EntryExpiry);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Returns the stored entry for `key` if it is still live.
    pub async fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.inner.get(key).await.filter(|entry| !entry.is_expired())
    }

    /// Processes pending evictions so that [`len`](CacheStore::len) is up to date.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl CacheStore for InMemoryStore {
    async fn get(&self, key: &QueryKey) -> Result<Option<Bytes>, StoreError> {
        Ok(self.entry(key).await.map(CacheEntry::into_value))
    }

    async fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        self.inner.insert(key.clone(), CacheEntry::new(value, ttl)).await;
        Ok(())
    }

    async fn delete(&self, key: &QueryKey) -> Result<(), StoreError> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.inner.entry_count())
    }
}
