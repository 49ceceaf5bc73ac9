// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache-aside read-through coordination with single-flight de-duplication.
//!
//! A [`Coordinator`] sits between callers and an expensive source of truth. Each read first
//! asks a side cache ([`CacheStore`]); on a miss the result is computed once, written to the
//! store with a time-to-live and handed to every caller that asked for it meanwhile.
//!
//! - **Read-through**: a hit never invokes the computation; an entry is never served past its
//!   time-to-live.
//! - **Single-flight**: concurrent misses for one key share a single computation and all see
//!   its outcome.
//! - **Degradation**: an unreachable store turns reads into misses and writes into log lines.
//!   Computation errors reach every waiter unchanged and are never cached.
//! - **Invalidation**: [`Coordinator::invalidate`] drops a cached result immediately.
//!
//! # Examples
//!
//! ```
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! use std::time::Duration;
//!
//! use readthru::{Coordinator, QueryKey};
//!
//! let coordinator: Coordinator<u64, _> = Coordinator::builder_memory().build();
//! let key = QueryKey::derive("crimes.count", &serde_json::json!({ "Primary Type": "ROBBERY" }))?;
//!
//! let count = coordinator
//!     .get(&key, || async { Ok::<_, std::io::Error>(42) }, Duration::from_secs(20))
//!     .await?;
//! assert_eq!(count, 42);
//!
//! coordinator.invalidate(&key).await?;
//! let count = coordinator
//!     .get(&key, || async { Ok::<_, std::io::Error>(45) }, Duration::from_secs(20))
//!     .await?;
//! assert_eq!(count, 45);
//! # Ok::<(), readthru::Error>(())
//! # });
//! ```
//!
//! # Stores
//!
//! Any [`CacheStore`] works. The `memory` feature (on by default) adds
//! [`Coordinator::builder_memory`] backed by `readthru_memory`; `readthru_redis` provides a
//! Redis-backed store.
//!
//! # Features
//!
//! - `memory` *(default)*: in-memory store support.
//! - `test-util`: re-exports `readthru_store::testing` for failure injection in tests.

mod builder;
mod codec;
mod coordinator;
mod error;
mod flight;
mod query;
mod stats;
mod telemetry;

#[doc(inline)]
pub use builder::CoordinatorBuilder;
#[doc(inline)]
pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec};
#[doc(inline)]
pub use coordinator::Coordinator;
#[doc(inline)]
pub use error::{ComputationAborted, Error};
#[doc(inline)]
pub use query::Query;
#[cfg(feature = "memory")]
#[doc(inline)]
pub use readthru_memory::InMemoryStore;
#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use readthru_store::testing;
#[doc(inline)]
pub use readthru_store::{CacheStore, KeyError, QueryKey, StoreError};
#[doc(inline)]
pub use stats::CoordinatorStats;
