// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache store backends.
//!
//! [`CacheStore`] defines the interface a side cache must provide to the coordinator: keyed
//! byte values with a per-key time-to-live.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;

use crate::{QueryKey, StoreError};

/// Trait for cache store implementations.
///
/// Stores are externally synchronized: every method must be safe to call concurrently and
/// must behave atomically per key. A store is the only authority on expiration, so `get`
/// must never return a value whose TTL has elapsed.
pub trait CacheStore: Send + Sync {
    /// Gets a live value, returning `None` if it is absent or expired.
    fn get(&self, key: &QueryKey) -> impl Future<Output = Result<Option<Bytes>, StoreError>> + Send;

    /// Stores a value that expires after `ttl`, replacing any previous value.
    fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a value. Removing an absent key succeeds.
    fn delete(&self, key: &QueryKey) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the store contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}

impl<S> CacheStore for Arc<S>
where
    S: CacheStore,
{
    fn get(&self, key: &QueryKey) -> impl Future<Output = Result<Option<Bytes>, StoreError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &QueryKey) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete(key)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}
