// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! High-performance in-memory cache store backed by moka.
//!
//! This crate provides [`InMemoryStore`], a concurrent side cache for the `readthru`
//! coordinator. Every entry carries its own time-to-live. Use [`InMemoryStoreBuilder`] to
//! configure capacity without exposing moka types directly.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use readthru_memory::InMemoryStore;
//! use readthru_store::{CacheStore, QueryKey};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let store = InMemoryStore::builder().max_capacity(1000).build();
//! let key = QueryKey::new("robbery_count");
//!
//! store.set(&key, Bytes::from_static(b"42"), Duration::from_secs(20)).await?;
//! assert_eq!(store.get(&key).await?, Some(Bytes::from_static(b"42")));
//! # Ok::<(), readthru_store::StoreError>(())
//! # }).unwrap();
//! ```
//!
//! # Features
//!
//! - **Per-entry TTL**: each `set` carries its own expiration, enforced on every read
//! - **Capacity limits**: set a maximum entry count with automatic eviction
//! - **Thread-safe**: safe for concurrent access from multiple tasks

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::InMemoryStoreBuilder;
#[doc(inline)]
pub use store::InMemoryStore;
