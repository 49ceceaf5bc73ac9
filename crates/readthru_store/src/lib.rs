// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache store abstractions for building cache-aside backends.
//!
//! This crate defines the [`CacheStore`] trait that every side-cache backend must satisfy,
//! along with [`QueryKey`] for identifying cached query results, [`CacheEntry`] for storing
//! serialized results with an expiration instant, and [`StoreError`] for fallible operations.
//!
//! # Overview
//!
//! A store only moves bytes. Serialization, single-flight de-duplication and failure policy
//! live in the `readthru` coordinator, which treats any [`CacheStore`] as an externally
//! synchronized key-value store with per-key TTL.
//!
//! # Implementing a Cache Store
//!
//! ```
//! use std::{collections::HashMap, sync::Mutex, time::Duration};
//!
//! use bytes::Bytes;
//! use readthru_store::{CacheEntry, CacheStore, QueryKey, StoreError};
//!
//! #[derive(Default)]
//! struct SimpleStore(Mutex<HashMap<QueryKey, CacheEntry>>);
//!
//! impl CacheStore for SimpleStore {
//!     async fn get(&self, key: &QueryKey) -> Result<Option<Bytes>, StoreError> {
//!         let map = self.0.lock().map_err(|_| StoreError::from_message("poisoned"))?;
//!         Ok(map.get(key).filter(|e| !e.is_expired()).map(|e| e.value().clone()))
//!     }
//!
//!     async fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
//!         let mut map = self.0.lock().map_err(|_| StoreError::from_message("poisoned"))?;
//!         map.insert(key.clone(), CacheEntry::new(value, ttl));
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &QueryKey) -> Result<(), StoreError> {
//!         let mut map = self.0.lock().map_err(|_| StoreError::from_message("poisoned"))?;
//!         map.remove(key);
//!         Ok(())
//!     }
//! }
//! ```

mod entry;
pub mod error;
mod key;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::{KeyError, StoreError};
#[doc(inline)]
pub use key::{MAX_KEY_LEN, QueryKey};
#[doc(inline)]
pub use store::CacheStore;
