// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coordinator statistics tracking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters owned by one coordinator.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    computations: AtomicU64,
    compute_failures: AtomicU64,
    store_errors: AtomicU64,
    invalidations: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compute_failure(&self) {
        self.compute_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            compute_failures: self.compute_failures.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of a coordinator's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CoordinatorStats {
    /// `get` calls answered from the cache store.
    pub hits: u64,
    /// `get` calls that found nothing usable in the cache store.
    pub misses: u64,
    /// Misses that joined a computation already in flight instead of starting one.
    pub coalesced: u64,
    /// Computations started.
    pub computations: u64,
    /// Computations that failed or aborted.
    pub compute_failures: u64,
    /// Cache store operations that failed or returned undecodable data.
    pub store_errors: u64,
    /// Successful `invalidate` calls.
    pub invalidations: u64,
}

impl CoordinatorStats {
    /// Fraction of `get` calls served from the cache store, or 0 if there were none.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "ratio does not need full u64 precision")]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_coalesced();
        counters.record_computation();
        counters.record_compute_failure();
        counters.record_store_error();
        counters.record_invalidation();

        let stats = counters.snapshot();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.compute_failures, 1);
        assert_eq!(stats.store_errors, 1);
        assert_eq!(stats.invalidations, 1);
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_ratio_of_idle_coordinator_is_zero() {
        assert!(CoordinatorStats::default().hit_ratio().abs() < f64::EPSILON);
    }
}
