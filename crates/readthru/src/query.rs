// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Queries that derive their own cache keys.

use std::error::Error as StdError;

use readthru_store::{KeyError, QueryKey};

/// A named, parameterized query against a source of truth.
///
/// A query knows how to identify itself as a [`QueryKey`] and how to run itself. It knows
/// nothing about caching; pass it to [`Coordinator::query`](crate::Coordinator::query) to run it
/// through the cache.
///
/// # Examples
///
/// ```
/// use readthru::Query;
/// use readthru_store::{KeyError, QueryKey};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct CountByType {
///     primary_type: &'static str,
/// }
///
/// impl Query for CountByType {
///     type Output = u64;
///     type Error = std::io::Error;
///
///     fn key(&self) -> Result<QueryKey, KeyError> {
///         QueryKey::derive("crimes.count", self)
///     }
///
///     async fn execute(self) -> Result<u64, std::io::Error> {
///         Ok(42)
///     }
/// }
///
/// let robberies = CountByType { primary_type: "ROBBERY" };
/// let burglaries = CountByType { primary_type: "BURGLARY" };
/// assert_ne!(robberies.key().unwrap(), burglaries.key().unwrap());
/// ```
pub trait Query: Send + 'static {
    /// The value the query produces.
    type Output;

    /// The error the query fails with.
    type Error: StdError + Send + Sync + 'static;

    /// Returns the key identifying this query and its parameters.
    ///
    /// Logically identical queries must return identical keys.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if no valid key can be formed from the parameters.
    fn key(&self) -> Result<QueryKey, KeyError>;

    /// Runs the query against its source of truth.
    fn execute(self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send + 'static;
}
