// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed cache store.
//!
//! [`RedisStore`] keeps query results in Redis so that several processes share one side
//! cache. Values are written with `SET key value PX <ttl>`, so Redis itself enforces expiry
//! and never returns a value past its TTL.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use readthru_redis::RedisStore;
//! use readthru_store::{CacheStore, QueryKey};
//!
//! # async fn example() -> Result<(), readthru_store::StoreError> {
//! let store = RedisStore::connect("redis://127.0.0.1:6379/")
//!     .await?
//!     .with_prefix("crimes")
//!     .with_timeout(Duration::from_millis(50));
//!
//! let key = QueryKey::new("longquery_result");
//! store.set(&key, Bytes::from_static(b"42"), Duration::from_secs(20)).await?;
//! assert_eq!(store.get(&key).await?, Some(Bytes::from_static(b"42")));
//! # Ok(())
//! # }
//! ```

mod store;

#[doc(inline)]
pub use store::RedisStore;
