// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// A serialized query result with its expiration instant.
///
/// Instants come from [`tokio::time::Instant`], so a paused test runtime controls expiration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use readthru_store::CacheEntry;
///
/// let entry = CacheEntry::new(Bytes::from_static(b"42"), Duration::from_secs(20));
/// assert_eq!(entry.value().as_ref(), b"42");
/// assert!(!entry.is_expired());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    value: Bytes,
    ttl: Duration,
    expires_at: Instant,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` from now.
    #[must_use]
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        Self::with_expires_at(value, ttl, Instant::now() + ttl)
    }

    /// Creates an entry with an explicit expiration instant.
    #[must_use]
    pub fn with_expires_at(value: Bytes, ttl: Duration, expires_at: Instant) -> Self {
        Self { value, ttl, expires_at }
    }

    /// Returns the serialized value.
    #[must_use]
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Consumes the entry and returns the serialized value.
    #[must_use]
    pub fn into_value(self) -> Bytes {
        self.value
    }

    /// Returns the time-to-live the entry was stored with.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the instant after which the entry must not be served.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns `true` if the entry has expired at `now`.
    ///
    /// An entry is live strictly before its expiration instant.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the entry has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Returns the time left before the entry expires, or zero if it already has.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
