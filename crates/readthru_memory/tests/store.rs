// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryStore`.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use readthru_memory::{InMemoryStore, InMemoryStoreBuilder};
use readthru_store::{CacheStore, QueryKey};
use tokio::time::advance;

const TTL: Duration = Duration::from_secs(20);

fn key(name: &str) -> QueryKey {
    QueryKey::new(name)
}

#[test]
fn new_store_is_empty() {
    assert_eq!(InMemoryStore::new().len(), Some(0));
    assert_eq!(InMemoryStore::with_capacity(10).is_empty(), Some(true));
    assert_eq!(InMemoryStore::default().len(), Some(0));
}

#[tokio::test]
async fn get_returns_none_for_missing_key() {
    let store = InMemoryStore::new();
    assert_eq!(store.get(&key("missing")).await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get_returns_value() {
    let store = InMemoryStore::new();
    store.set(&key("robbery_count"), Bytes::from_static(b"42"), TTL).await.unwrap();

    assert_eq!(store.get(&key("robbery_count")).await.unwrap(), Some(Bytes::from_static(b"42")));

    store.run_pending_tasks().await;
    assert_eq!(store.len(), Some(1));
}

#[tokio::test]
async fn set_overwrites_value_and_ttl() {
    let store = InMemoryStore::new();
    store.set(&key("k"), Bytes::from_static(b"1"), TTL).await.unwrap();
    store.set(&key("k"), Bytes::from_static(b"2"), TTL * 2).await.unwrap();

    let entry = store.entry(&key("k")).await.expect("entry should be live");
    assert_eq!(entry.value().as_ref(), b"2");
    assert_eq!(entry.ttl(), TTL * 2);
}

#[tokio::test(start_paused = true)]
async fn entries_are_never_served_past_ttl() {
    let store = InMemoryStore::new();
    store.set(&key("k"), Bytes::from_static(b"42"), TTL).await.unwrap();

    advance(TTL - Duration::from_millis(1)).await;
    assert!(store.get(&key("k")).await.unwrap().is_some());

    advance(Duration::from_millis(1)).await;
    assert_eq!(store.get(&key("k")).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn ttl_is_per_entry() {
    let store = InMemoryStore::new();
    store.set(&key("short"), Bytes::from_static(b"s"), Duration::from_secs(1)).await.unwrap();
    store.set(&key("long"), Bytes::from_static(b"l"), Duration::from_secs(60)).await.unwrap();

    advance(Duration::from_secs(2)).await;
    assert_eq!(store.get(&key("short")).await.unwrap(), None);
    assert_eq!(store.get(&key("long")).await.unwrap(), Some(Bytes::from_static(b"l")));
}

#[tokio::test]
async fn delete_removes_and_is_idempotent() {
    let store = InMemoryStore::new();
    store.set(&key("k"), Bytes::from_static(b"v"), TTL).await.unwrap();

    store.delete(&key("k")).await.unwrap();
    assert_eq!(store.get(&key("k")).await.unwrap(), None);

    store.delete(&key("k")).await.unwrap();
    store.delete(&key("never-set")).await.unwrap();
}

#[tokio::test]
async fn clones_share_entries() {
    let store = InMemoryStore::builder().name("shared").build();
    let clone = store.clone();
    let arc = Arc::new(store.clone());

    clone.set(&key("k"), Bytes::from_static(b"v"), TTL).await.unwrap();
    assert!(store.get(&key("k")).await.unwrap().is_some());
    assert!(arc.get(&key("k")).await.unwrap().is_some());
}

#[tokio::test]
async fn bounded_store_evicts() {
    let store = InMemoryStoreBuilder::new().max_capacity(10).initial_capacity(10).build();

    for i in 0..100 {
        store.set(&key(&format!("k{i}")), Bytes::from(vec![0_u8; 8]), TTL).await.unwrap();
    }
    store.run_pending_tasks().await;

    assert!(store.len().unwrap() <= 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_access() {
    let store = Arc::new(InMemoryStore::new());
    let mut handles = Vec::new();

    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let k = key(&format!("k{}", i % 4));
            store.set(&k, Bytes::from(format!("{i}")), TTL).await.unwrap();
            store.get(&k).await.unwrap().is_some()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
}
