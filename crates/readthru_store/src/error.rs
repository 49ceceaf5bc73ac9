// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache store operations and key validation.

use std::{error::Error as StdError, fmt, sync::Arc};

type SharedSource = Arc<dyn StdError + Send + Sync + 'static>;

/// An error from a cache store operation.
///
/// This is an opaque error that can wrap any underlying error from a store implementation.
/// It is cheap to clone so that a single failure can be handed to several observers. Use
/// [`std::error::Error::source()`] to access the underlying cause if needed.
///
/// # Example
///
/// ```
/// use readthru_store::StoreError;
///
/// let error = StoreError::from_message("connection refused");
/// assert_eq!(error.to_string(), "connection refused");
/// ```
#[derive(Debug, Clone)]
pub struct StoreError {
    message: String,
    source: Option<SharedSource>,
}

impl StoreError {
    /// Creates an error carrying only a message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error caused by another error.
    ///
    /// The cause's display text becomes this error's message and the cause itself stays
    /// reachable through [`std::error::Error::source()`].
    pub fn caused_by<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: cause.to_string(),
            source: Some(Arc::new(cause)),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for StoreError {
    // The cause itself, not the `Arc` holding it.
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// A query key that cannot be used with a cache store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// The key is empty.
    #[error("query key is empty")]
    Empty,

    /// The key is longer than [`MAX_KEY_LEN`](crate::MAX_KEY_LEN) bytes.
    #[error("query key is {len} bytes long, the limit is {max}")]
    TooLong {
        /// Length of the rejected key in bytes.
        len: usize,
        /// Maximum accepted length in bytes.
        max: usize,
    },

    /// The key contains whitespace or a control character.
    #[error("query key contains invalid character {found:?} at byte {position}")]
    InvalidCharacter {
        /// The offending character.
        found: char,
        /// Byte offset of the offending character.
        position: usize,
    },

    /// The query parameters could not be serialized for hashing.
    #[error("query parameters cannot be serialized: {0}")]
    Params(String),
}
