// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-aside coordinator.

use std::{borrow::Cow, error::Error as StdError, fmt::Display, sync::Arc, time::Duration};

use readthru_store::{CacheStore, QueryKey};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{task::JoinError, time::Instant};

use crate::{
    Codec, ComputationAborted, CoordinatorStats, Error, JsonCodec, Query,
    flight::{InFlight, Joined, Outcome, Ticket},
    stats::Counters,
    telemetry::{self, Activity, Operation},
};

/// Reads through a cache store, computing and caching results on a miss.
///
/// `get` first asks the store. On a hit the stored result is returned and nothing is computed.
/// On a miss the result is computed, written to the store with the requested time-to-live and
/// returned. Concurrent misses for the same key share one computation: the first caller starts
/// it and everyone else waits for its outcome, success or failure.
///
/// The store is a cache, not a dependency. A failed read is treated as a miss and a failed
/// write is logged and dropped; neither fails `get`. Only failures of the computation itself
/// reach the caller, unchanged and never retried.
///
/// Computations run on spawned tokio tasks, so a caller that stops waiting does not cancel
/// the computation for other waiters. All methods must be called within a tokio runtime.
///
/// Clones share the same store, in-flight table and statistics.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// use std::time::Duration;
///
/// use readthru::Coordinator;
/// use readthru_store::QueryKey;
///
/// let coordinator: Coordinator<u64, _> = Coordinator::builder_memory().name("crimes").build();
/// let key = QueryKey::new("robbery_count");
///
/// let count = coordinator
///     .get(&key, || async { Ok::<_, std::io::Error>(42) }, Duration::from_secs(20))
///     .await?;
/// assert_eq!(count, 42);
///
/// // Served from the cache; the computation is not invoked.
/// let count = coordinator
///     .get(&key, || async { Ok::<_, std::io::Error>(45) }, Duration::from_secs(20))
///     .await?;
/// assert_eq!(count, 42);
/// # Ok::<(), readthru::Error>(())
/// # });
/// ```
pub struct Coordinator<V, S, C = JsonCodec> {
    inner: Arc<Inner<V, S, C>>,
}

struct Inner<V, S, C> {
    name: Cow<'static, str>,
    store: S,
    codec: C,
    flights: InFlight<V>,
    counters: Counters,
}

impl<V, S, C> Clone for Coordinator<V, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, S, C> std::fmt::Debug for Coordinator<V, S, C>
where
    S: std::fmt::Debug,
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.inner.name)
            .field("store", &self.inner.store)
            .field("codec", &self.inner.codec)
            .field("in_flight", &self.inner.flights.len())
            .finish()
    }
}

impl<V, S, C> Coordinator<V, S, C> {
    pub(crate) fn from_parts(name: Cow<'static, str>, store: S, codec: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                store,
                codec,
                flights: InFlight::default(),
                counters: Counters::default(),
            }),
        }
    }

    /// Returns the name this coordinator reports in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the underlying cache store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Returns a snapshot of this coordinator's counters.
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        self.inner.counters.snapshot()
    }

    /// Returns the number of keys with a computation currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.flights.len()
    }
}

impl<V, S, C> Coordinator<V, S, C>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    S: CacheStore + 'static,
    C: Codec,
{
    /// Returns the cached result for `key`, or computes, caches and returns it.
    ///
    /// `compute` is invoked only on a miss, and only if no computation for `key` is already
    /// in flight; otherwise this call waits for that computation's outcome. A successful
    /// result is written to the store with `ttl` before any waiter is released.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if `key` is malformed, and [`Error::InvalidTtl`] if `ttl` is zero.
    ///   Neither touches the store nor invokes `compute`.
    /// - [`Error::ComputeFailed`] if the computation this call waited on failed or panicked.
    ///   Nothing is cached in that case.
    pub async fn get<F, Fut, E>(&self, key: &QueryKey, compute: F, ttl: Duration) -> Result<V, Error>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: StdError + Send + Sync + 'static,
    {
        key.validate()?;
        if ttl.is_zero() {
            return Err(Error::InvalidTtl);
        }

        let inner = &self.inner;
        let started = Instant::now();

        if let Some(value) = inner.lookup(key).await {
            inner.counters.record_hit();
            inner.emit(Operation::Get, Activity::Hit, key, Some(started.elapsed()), None);
            return Ok(value);
        }

        inner.counters.record_miss();
        inner.emit(Operation::Get, Activity::Miss, key, Some(started.elapsed()), None);

        let joined = inner.flights.join_or_start(
            key,
            |ticket| Arc::clone(inner).fill(key.clone(), ticket, compute, ttl),
            Arc::clone(inner).abort_handler(key.clone()),
        );

        let outcome = match joined {
            Joined::Leader(outcome) => outcome,
            Joined::Follower(outcome) => {
                inner.counters.record_coalesced();
                inner.emit(Operation::Get, Activity::Coalesced, key, None, None);
                outcome
            }
        };
        outcome.await
    }

    /// Runs `query` through the cache under the key it derives for itself.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get). A query that cannot form a key fails with
    /// [`Error::InvalidKey`] without being executed.
    pub async fn query<Q>(&self, query: Q, ttl: Duration) -> Result<V, Error>
    where
        Q: Query<Output = V>,
    {
        let key = query.key()?;
        self.get(&key, move || query.execute(), ttl).await
    }

    /// Removes the cached result for `key`, regardless of its remaining time-to-live.
    ///
    /// A computation already in flight for `key` keeps running and still answers the callers
    /// waiting on it, but its result is not cached, and the next `get` starts a fresh
    /// computation. Invalidating an absent key succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if `key` is malformed.
    /// - [`Error::CacheUnavailable`] if the store could not delete the entry.
    pub async fn invalidate(&self, key: &QueryKey) -> Result<(), Error> {
        key.validate()?;
        let inner = &self.inner;

        if inner.flights.detach(key) {
            inner.emit(Operation::Invalidate, Activity::Detached, key, None, None);
        }

        match inner.store.delete(key).await {
            Ok(()) => {
                inner.counters.record_invalidation();
                inner.emit(Operation::Invalidate, Activity::Invalidated, key, None, None);
                Ok(())
            }
            Err(e) => {
                inner.counters.record_store_error();
                inner.emit(Operation::Invalidate, Activity::StoreError, key, None, Some(&e));
                Err(Error::CacheUnavailable(e))
            }
        }
    }
}

impl<V, S, C> Inner<V, S, C>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    S: CacheStore + 'static,
    C: Codec,
{
    fn emit(
        &self,
        operation: Operation,
        activity: Activity,
        key: &QueryKey,
        duration: Option<Duration>,
        detail: Option<&dyn Display>,
    ) {
        telemetry::emit(&self.name, operation, activity, key, duration, detail);
    }

    /// Reads and decodes a live value. Store and decode failures count as a miss.
    async fn lookup(&self, key: &QueryKey) -> Option<V> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match self.codec.decode(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.counters.record_store_error();
                    self.emit(Operation::Get, Activity::CodecError, key, None, Some(&e));
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.counters.record_store_error();
                self.emit(Operation::Get, Activity::StoreError, key, None, Some(&e));
                None
            }
        }
    }

    /// The body of a flight: re-read, compute, then populate unless the key was invalidated
    /// meanwhile.
    async fn fill<F, Fut, E>(
        self: Arc<Self>,
        key: QueryKey,
        ticket: Ticket,
        compute: F,
        ttl: Duration,
    ) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: StdError + Send + Sync + 'static,
    {
        // The previous flight for this key may have landed while the caller was reading.
        if let Some(value) = self.lookup(&key).await {
            self.emit(Operation::Get, Activity::Hit, &key, None, None);
            return Ok(value);
        }

        self.counters.record_computation();
        let started = Instant::now();

        match compute().await {
            Ok(value) => {
                self.emit(Operation::Get, Activity::Computed, &key, Some(started.elapsed()), None);
                self.populate(&key, &value, ttl, &ticket).await;
                Ok(value)
            }
            Err(e) => {
                self.counters.record_compute_failure();
                let error = Error::compute_failed(key.clone(), e);
                let elapsed = Some(started.elapsed());
                self.emit(Operation::Get, Activity::ComputeFailed, &key, elapsed, Some(&error));
                Err(error)
            }
        }
    }

    async fn populate(&self, key: &QueryKey, value: &V, ttl: Duration, ticket: &Ticket) {
        if ticket.is_detached() {
            self.emit(Operation::Get, Activity::Detached, key, None, None);
            return;
        }

        let bytes = match self.codec.encode(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.counters.record_store_error();
                self.emit(Operation::Get, Activity::CodecError, key, None, Some(&e));
                return;
            }
        };

        if let Err(e) = self.store.set(key, bytes, ttl).await {
            self.counters.record_store_error();
            self.emit(Operation::Get, Activity::StoreError, key, None, Some(&e));
            return;
        }

        // An invalidation that landed during the write must win.
        if ticket.is_detached() {
            if let Err(e) = self.store.delete(key).await {
                self.counters.record_store_error();
                self.emit(Operation::Get, Activity::StoreError, key, None, Some(&e));
            }
            self.emit(Operation::Get, Activity::Detached, key, None, None);
            return;
        }

        self.emit(Operation::Get, Activity::Inserted, key, None, None);
    }

    /// Turns a flight task that never returned into the error its waiters receive.
    fn abort_handler(self: Arc<Self>, key: QueryKey) -> impl FnOnce(JoinError) -> Error + Send + 'static {
        move |join_error| {
            self.counters.record_compute_failure();
            let error = Error::compute_failed(key.clone(), ComputationAborted::from_join_error(join_error));
            self.emit(Operation::Get, Activity::ComputeFailed, &key, None, Some(&error));
            error
        }
    }
}
