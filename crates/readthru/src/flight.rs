// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-flight computation table.
//!
//! Each key has at most one computation running at a time. The first caller to miss (the
//! leader) spawns the computation as a detached task and publishes a shared handle to its
//! outcome; later callers for the same key (followers) clone that handle and wait on it. All of
//! them observe the single outcome the task produces.
//!
//! The table's mutex is held only while looking up, inserting or removing a marker, never
//! while a computation runs. Because the computation lives on its own task, a caller that
//! stops waiting (timeout, drop) does not cancel it for everyone else.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use readthru_store::QueryKey;
use tokio::task::JoinError;

use crate::Error;

pub(crate) type Outcome<V> = Result<V, Error>;
pub(crate) type SharedOutcome<V> = Shared<BoxFuture<'static, Outcome<V>>>;

type FlightMap<V> = Arc<Mutex<HashMap<QueryKey, Flight<V>>>>;

struct Flight<V> {
    id: u64,
    outcome: SharedOutcome<V>,
    detached: Arc<AtomicBool>,
}

/// How a caller got attached to a computation.
pub(crate) enum Joined<V> {
    /// The caller started the computation.
    Leader(SharedOutcome<V>),
    /// The caller joined a computation that was already running.
    Follower(SharedOutcome<V>),
}

/// Handed to the computation so it can tell whether its key was invalidated meanwhile.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    detached: Arc<AtomicBool>,
}

impl Ticket {
    /// Returns `true` once the flight has been detached from its key by an invalidation.
    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}

/// Removes the flight's marker when its task ends, however it ends.
struct Landing<V> {
    flights: FlightMap<V>,
    key: QueryKey,
    id: u64,
}

impl<V> Drop for Landing<V> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock();
        // The marker may already belong to a newer flight if this one was detached.
        if flights.get(&self.key).is_some_and(|flight| flight.id == self.id) {
            flights.remove(&self.key);
        }
    }
}

pub(crate) struct InFlight<V> {
    flights: FlightMap<V>,
    next_id: AtomicU64,
}

impl<V> Default for InFlight<V> {
    fn default() -> Self {
        Self {
            flights: Arc::default(),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<V> std::fmt::Debug for InFlight<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight").field("len", &self.len()).finish()
    }
}

impl<V> InFlight<V> {
    /// Number of keys with a computation in flight.
    pub(crate) fn len(&self) -> usize {
        self.flights.lock().len()
    }

    /// Detaches the computation running for `key`, if any.
    ///
    /// The computation keeps running and still answers the callers already waiting on it,
    /// but the next caller for `key` starts a fresh one.
    pub(crate) fn detach(&self, key: &QueryKey) -> bool {
        let removed = self.flights.lock().remove(key);
        removed.is_some_and(|flight| {
            flight.detached.store(true, Ordering::Release);
            true
        })
    }
}

impl<V> InFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Joins the computation running for `key`, or starts one with `work`.
    ///
    /// `work` only builds the computation's future; it runs on a spawned task. `on_abort`
    /// turns a task that never produced an outcome into the error every waiter receives.
    pub(crate) fn join_or_start<W, Fut, A>(&self, key: &QueryKey, work: W, on_abort: A) -> Joined<V>
    where
        W: FnOnce(Ticket) -> Fut,
        Fut: Future<Output = Outcome<V>> + Send + 'static,
        A: FnOnce(JoinError) -> Error + Send + 'static,
    {
        let mut flights = self.flights.lock();
        if let Some(flight) = flights.get(key) {
            return Joined::Follower(flight.outcome.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let detached = Arc::new(AtomicBool::new(false));
        let landing = Landing {
            flights: Arc::clone(&self.flights),
            key: key.clone(),
            id,
        };

        let computation = work(Ticket {
            detached: Arc::clone(&detached),
        });
        let handle = tokio::spawn(async move {
            let _landing = landing;
            computation.await
        });
        let outcome = async move { handle.await.unwrap_or_else(|e| Err(on_abort(e))) }.boxed().shared();

        flights.insert(
            key.clone(),
            Flight {
                id,
                outcome: outcome.clone(),
                detached,
            },
        );
        Joined::Leader(outcome)
    }
}
