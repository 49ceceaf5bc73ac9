// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `CacheEntry`.

use std::time::Duration;

use bytes::Bytes;
use readthru_store::CacheEntry;
use tokio::time::{Instant, advance};

#[tokio::test(start_paused = true)]
async fn new_entry_expires_after_ttl() {
    let entry = CacheEntry::new(Bytes::from_static(b"42"), Duration::from_secs(20));
    assert_eq!(entry.ttl(), Duration::from_secs(20));
    assert!(!entry.is_expired());

    advance(Duration::from_secs(19)).await;
    assert!(!entry.is_expired());
    assert_eq!(entry.remaining(), Duration::from_secs(1));

    advance(Duration::from_secs(1)).await;
    assert!(entry.is_expired());
    assert_eq!(entry.remaining(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn with_expires_at_uses_given_instant() {
    let now = Instant::now();
    let entry = CacheEntry::with_expires_at(Bytes::from_static(b"x"), Duration::from_secs(5), now + Duration::from_secs(1));

    assert_eq!(entry.expires_at(), now + Duration::from_secs(1));
    assert!(!entry.is_expired_at(now));
    assert!(entry.is_expired_at(now + Duration::from_secs(1)));
}

#[test]
fn into_value_returns_bytes() {
    let entry = CacheEntry::new(Bytes::from_static(b"payload"), Duration::from_secs(1));
    assert_eq!(entry.value().as_ref(), b"payload");
    assert_eq!(entry.into_value(), Bytes::from_static(b"payload"));
}
