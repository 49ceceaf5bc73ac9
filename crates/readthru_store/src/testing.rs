// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records every operation,
//! honors TTLs and supports failure injection for testing degraded paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{CacheEntry, CacheStore, QueryKey, StoreError};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(QueryKey),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: QueryKey,
        /// The serialized value that was written.
        value: Bytes,
        /// The time-to-live requested for the value.
        ttl: Duration,
    },
    /// A delete operation was performed with the given key.
    Delete(QueryKey),
}

impl StoreOp {
    /// Returns the key the operation targeted.
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Get(key) | Self::Delete(key) | Self::Set { key, .. } => key,
        }
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Clones share the same data, operation log and failure predicate.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use readthru_store::{CacheStore, QueryKey, testing::{MockStore, StoreOp}};
///
/// # block_on(async {
/// let store = MockStore::new();
/// let key = QueryKey::new("robbery_count");
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get(&key).await.is_err());
///
/// store.clear_failures();
/// store.set(&key, Bytes::from_static(b"42"), Duration::from_secs(20)).await.unwrap();
/// assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from_static(b"42")));
/// # });
/// # fn block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub struct MockStore {
    data: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets a predicate that decides which operations fail.
    ///
    /// A failing operation is still recorded but does not touch the data.
    ///
    /// # Examples
    ///
    /// ```
    /// use readthru_store::testing::{MockStore, StoreOp};
    ///
    /// let store = MockStore::new();
    ///
    /// // Fail every write
    /// store.fail_when(|op| matches!(op, StoreOp::Set { .. }));
    ///
    /// // Fail reads of one key
    /// store.fail_when(|op| matches!(op, StoreOp::Get(k) if k.as_str() == "bad_key"));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Returns the number of recorded operations matching `predicate`.
    pub fn count_operations(&self, predicate: impl Fn(&StoreOp) -> bool) -> usize {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns the stored entry for `key`, expired or not.
    #[must_use]
    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.data.lock().get(key).cloned()
    }

    /// Returns `true` if a live entry exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &QueryKey) -> bool {
        self.data.lock().get(key).is_some_and(|entry| !entry.is_expired())
    }

    /// Stores an entry directly, bypassing recording and failure injection.
    pub fn seed(&self, key: QueryKey, entry: CacheEntry) {
        self.data.lock().insert(key, entry);
    }

    fn record(&self, op: StoreOp) -> Result<(), StoreError> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        let message = match &op {
            StoreOp::Get(_) => "mock: get failed",
            StoreOp::Set { .. } => "mock: set failed",
            StoreOp::Delete(_) => "mock: delete failed",
        };
        self.operations.lock().push(op);

        if fail { Err(StoreError::from_message(message)) } else { Ok(()) }
    }
}

impl CacheStore for MockStore {
    async fn get(&self, key: &QueryKey) -> Result<Option<Bytes>, StoreError> {
        self.record(StoreOp::Get(key.clone()))?;

        let mut data = self.data.lock();
        if data.get(key).is_some_and(CacheEntry::is_expired) {
            data.remove(key);
        }
        Ok(data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        self.record(StoreOp::Set {
            key: key.clone(),
            value: value.clone(),
            ttl,
        })?;

        self.data.lock().insert(key.clone(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &QueryKey) -> Result<(), StoreError> {
        self.record(StoreOp::Delete(key.clone()))?;

        self.data.lock().remove(key);
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
