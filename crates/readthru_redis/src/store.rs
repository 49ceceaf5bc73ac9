// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, time::Duration};

use bytes::Bytes;
use readthru_store::{CacheStore, QueryKey, StoreError};
use redis::{AsyncCommands, Client, aio::ConnectionManager};

/// A cache store backed by a Redis server.
///
/// The store holds a reconnecting connection manager; clones share it. Every Redis or
/// connection failure is reported as a [`StoreError`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: Option<String>,
    timeout: Option<Duration>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection attempt fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(StoreError::caused_by)?;
        let conn = ConnectionManager::new(client).await.map_err(StoreError::caused_by)?;
        tracing::debug!(url, "connected to redis cache store");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an existing connection manager.
    #[must_use]
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            prefix: None,
            timeout: None,
        }
    }

    /// Namespaces every key as `{prefix}:{key}`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Fails any single Redis round trip that takes longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn redis_key(&self, key: &QueryKey) -> String {
        redis_key(self.prefix.as_deref(), key)
    }

    async fn bounded<T>(&self, op: impl Future<Output = redis::RedisResult<T>>) -> Result<T, StoreError> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_elapsed| StoreError::from_message(format!("redis operation timed out after {limit:?}")))?,
            None => op.await,
        };
        result.map_err(StoreError::caused_by)
    }
}

fn redis_key(prefix: Option<&str>, key: &QueryKey) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{key}"),
        None => key.as_str().to_owned(),
    }
}

/// Redis `PX` takes whole milliseconds; round up so a tiny TTL never becomes "no expiry".
fn ttl_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}

impl CacheStore for RedisStore {
    async fn get(&self, key: &QueryKey) -> Result<Option<Bytes>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = self.bounded(conn.get(self.redis_key(key))).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &QueryKey, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.redis_key(key)).arg(value.as_ref()).arg("PX").arg(ttl_millis(ttl));
        self.bounded(cmd.query_async::<_, ()>(&mut conn)).await
    }

    async fn delete(&self, key: &QueryKey) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(self.redis_key(key))).await
    }
}
