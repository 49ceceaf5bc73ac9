// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "test-util")]

//! Integration tests for `MockStore`.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use readthru_store::{
    CacheStore, QueryKey,
    testing::{MockStore, StoreOp},
};
use tokio::time::advance;

const TTL: Duration = Duration::from_secs(20);

#[tokio::test(start_paused = true)]
async fn set_then_get_until_expiry() {
    let store = MockStore::new();
    let key = QueryKey::new("robbery_count");

    assert_eq!(store.get(&key).await.unwrap(), None);
    store.set(&key, Bytes::from_static(b"42"), TTL).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from_static(b"42")));

    advance(TTL).await;
    assert_eq!(store.get(&key).await.unwrap(), None);
    assert_eq!(store.len(), Some(0));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = MockStore::new();
    let key = QueryKey::new("k");

    store.delete(&key).await.unwrap();
    store.set(&key, Bytes::from_static(b"v"), TTL).await.unwrap();
    store.delete(&key).await.unwrap();
    store.delete(&key).await.unwrap();

    assert!(!store.contains_key(&key));
    assert_eq!(store.count_operations(|op| matches!(op, StoreOp::Delete(_))), 3);
}

#[tokio::test]
async fn failures_are_recorded_and_leave_data_untouched() {
    let store = MockStore::new();
    let key = QueryKey::new("k");
    store.fail_when(|op| matches!(op, StoreOp::Set { .. }));

    let err = store.set(&key, Bytes::from_static(b"v"), TTL).await.unwrap_err();
    assert_eq!(err.message(), "mock: set failed");
    assert!(!store.contains_key(&key));
    assert_eq!(
        store.operations(),
        vec![StoreOp::Set {
            key: key.clone(),
            value: Bytes::from_static(b"v"),
            ttl: TTL,
        }]
    );

    store.clear_failures();
    store.set(&key, Bytes::from_static(b"v"), TTL).await.unwrap();
    assert!(store.contains_key(&key));
}

#[tokio::test]
async fn clones_share_state() {
    let store = MockStore::new();
    let shared = Arc::new(store.clone());
    let key = QueryKey::new("k");

    shared.set(&key, Bytes::from_static(b"v"), TTL).await.unwrap();
    assert!(store.contains_key(&key));
    assert_eq!(store.operations().len(), 1);
    assert_eq!(store.operations()[0].key(), &key);

    store.clear_operations();
    assert!(shared.operations().is_empty());
}
