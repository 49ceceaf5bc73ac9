// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types returned by the coordinator.

use std::{error::Error as StdError, fmt, sync::Arc};

use readthru_store::{KeyError, QueryKey, StoreError};

/// An error from a coordinator operation.
///
/// Errors are cheap to clone: one failed computation is delivered to every caller that was
/// waiting on it, and all of them observe the same underlying source.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The query key is empty or malformed. Nothing was read, written or computed.
    InvalidKey(KeyError),

    /// The requested time-to-live is zero. Nothing was read, written or computed.
    InvalidTtl,

    /// The computation behind a cache miss failed.
    ///
    /// The source is the computation's own error, unchanged. Use
    /// [`compute_error`](Self::compute_error) to get it back as its concrete type.
    ComputeFailed {
        /// Key whose computation failed.
        key: QueryKey,
        /// The error returned by the computation.
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// The cache store could not be reached.
    ///
    /// Reads and writes done on behalf of `get` never surface this; only operations that
    /// cannot fall back, such as `invalidate`, do.
    CacheUnavailable(StoreError),
}

impl Error {
    pub(crate) fn compute_failed<E>(key: QueryKey, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::ComputeFailed {
            key,
            source: Arc::new(source),
        }
    }

    /// Returns the computation's error as `E`, if this is a [`ComputeFailed`](Self::ComputeFailed)
    /// error caused by an `E`.
    ///
    /// # Examples
    ///
    /// ```
    /// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
    /// use std::time::Duration;
    ///
    /// use readthru::Coordinator;
    /// use readthru_store::QueryKey;
    ///
    /// let coordinator: Coordinator<u64, _> = Coordinator::builder_memory().build();
    /// let err = coordinator
    ///     .get(&QueryKey::new("robbery_count"), || async { Err::<u64, _>(std::fmt::Error) }, Duration::from_secs(20))
    ///     .await
    ///     .unwrap_err();
    ///
    /// assert!(err.compute_error::<std::fmt::Error>().is_some());
    /// # });
    /// ```
    #[must_use]
    pub fn compute_error<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::ComputeFailed { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` if the computation behind a cache miss failed.
    #[must_use]
    pub fn is_compute_failed(&self) -> bool {
        matches!(self, Self::ComputeFailed { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(e) => write!(f, "invalid query key: {e}"),
            Self::InvalidTtl => f.write_str("time-to-live must be greater than zero"),
            Self::ComputeFailed { key, source } => write!(f, "computing `{key}` failed: {source}"),
            Self::CacheUnavailable(e) => write!(f, "cache store unavailable: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidKey(e) => Some(e),
            Self::InvalidTtl => None,
            Self::ComputeFailed { source, .. } => Some(source.as_ref()),
            Self::CacheUnavailable(e) => Some(e),
        }
    }
}

impl From<KeyError> for Error {
    fn from(error: KeyError) -> Self {
        Self::InvalidKey(error)
    }
}

/// The source of a [`Error::ComputeFailed`] whose computation never returned.
///
/// This happens when the computation panics or when its runtime shuts down before it finishes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("computation aborted: {reason}")]
pub struct ComputationAborted {
    reason: String,
}

impl ComputationAborted {
    pub(crate) fn from_join_error(error: tokio::task::JoinError) -> Self {
        let reason = if error.is_panic() {
            let payload = error.into_panic();
            payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .map_or_else(|| "panicked".to_owned(), |message| format!("panicked: {message}"))
        } else {
            "cancelled".to_owned()
        };
        Self { reason }
    }

    /// Returns why the computation did not finish.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_wraps_key_error() {
        let error = Error::from(KeyError::Empty);
        assert!(matches!(error, Error::InvalidKey(KeyError::Empty)));
        assert_eq!(error.to_string(), "invalid query key: query key is empty");
    }

    #[test]
    fn compute_failed_keeps_source_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "mongo timed out");
        let error = Error::compute_failed(QueryKey::new("robbery_count"), io);

        assert!(error.is_compute_failed());
        assert_eq!(error.to_string(), "computing `robbery_count` failed: mongo timed out");

        let source = error.compute_error::<std::io::Error>().expect("source should downcast");
        assert_eq!(source.kind(), std::io::ErrorKind::TimedOut);
        assert!(error.compute_error::<std::fmt::Error>().is_none());
    }

    #[test]
    fn clones_share_compute_source() {
        let error = Error::compute_failed(QueryKey::new("k"), std::fmt::Error);
        let cloned = error.clone();

        let (Error::ComputeFailed { source: a, .. }, Error::ComputeFailed { source: b, .. }) = (&error, &cloned) else {
            unreachable!("both are compute failures");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn cache_unavailable_exposes_store_error() {
        let error = Error::CacheUnavailable(StoreError::from_message("redis is down"));
        assert_eq!(error.to_string(), "cache store unavailable: redis is down");
        assert!(error.source().is_some_and(|source| source.is::<StoreError>()));
        assert!(!error.is_compute_failed());
    }

    #[test]
    fn source_chain_reaches_the_failing_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "mongo connection reset");
        let error = Error::compute_failed(QueryKey::new("robbery_count"), io);

        let chain: Vec<&(dyn StdError + 'static)> =
            std::iter::successors(Some(&error as &(dyn StdError + 'static)), |e| (*e).source()).collect();
        assert_eq!(chain.len(), 2);
        let io = chain[1].downcast_ref::<std::io::Error>().expect("io error is the direct source");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let store = Error::CacheUnavailable(StoreError::caused_by(refused));
        let root = std::iter::successors(Some(&store as &(dyn StdError + 'static)), |e| (*e).source())
            .last()
            .expect("chain is never empty");
        assert_eq!(
            root.downcast_ref::<std::io::Error>().map(std::io::Error::kind),
            Some(std::io::ErrorKind::ConnectionRefused)
        );
    }

    #[tokio::test]
    async fn aborted_reports_panic_message() {
        let handle: tokio::task::JoinHandle<()> = tokio::spawn(async { panic!("boom") });
        let join_error = handle.await.unwrap_err();
        let aborted = ComputationAborted::from_join_error(join_error);
        assert_eq!(aborted.reason(), "panicked: boom");
        assert_eq!(aborted.to_string(), "computation aborted: panicked: boom");
    }
}
