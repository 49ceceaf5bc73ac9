// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`Coordinator`].

use std::{borrow::Cow, marker::PhantomData};

#[cfg(feature = "memory")]
use readthru_memory::InMemoryStore;
use readthru_store::CacheStore;

use crate::{Codec, Coordinator, JsonCodec};

const DEFAULT_NAME: &str = "readthru";

/// Builder for constructing a [`Coordinator`].
///
/// Created by [`Coordinator::builder`] or [`Coordinator::builder_memory`].
///
/// # Examples
///
/// ```
/// use readthru::{BincodeCodec, Coordinator};
/// use readthru_memory::InMemoryStore;
///
/// let coordinator: Coordinator<Vec<u32>, _, _> = Coordinator::builder(InMemoryStore::new())
///     .name("crimes")
///     .codec(BincodeCodec)
///     .build();
///
/// assert_eq!(coordinator.name(), "crimes");
/// ```
#[derive(Debug)]
pub struct CoordinatorBuilder<V, S, C = JsonCodec> {
    name: Cow<'static, str>,
    store: S,
    codec: C,
    _phantom: PhantomData<fn() -> V>,
}

impl<V, S> CoordinatorBuilder<V, S, JsonCodec>
where
    S: CacheStore,
{
    pub(crate) fn new(store: S) -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            store,
            codec: JsonCodec,
            _phantom: PhantomData,
        }
    }
}

impl<V, S, C> CoordinatorBuilder<V, S, C> {
    /// Sets the name reported in logs. Defaults to `readthru`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the codec used to serialize results into the store. Defaults to [`JsonCodec`].
    #[must_use]
    pub fn codec<C2>(self, codec: C2) -> CoordinatorBuilder<V, S, C2>
    where
        C2: Codec,
    {
        CoordinatorBuilder {
            name: self.name,
            store: self.store,
            codec,
            _phantom: PhantomData,
        }
    }
}

impl<V, S, C> CoordinatorBuilder<V, S, C>
where
    S: CacheStore,
    C: Codec,
{
    /// Builds the coordinator.
    #[must_use]
    pub fn build(self) -> Coordinator<V, S, C> {
        Coordinator::from_parts(self.name, self.store, self.codec)
    }
}

impl Coordinator<(), (), ()> {
    /// Creates a builder for a coordinator in front of `store`.
    ///
    /// # Examples
    ///
    /// ```
    /// use readthru::Coordinator;
    /// use readthru_memory::InMemoryStore;
    ///
    /// let coordinator: Coordinator<u64, _> = Coordinator::builder(InMemoryStore::new()).build();
    /// assert_eq!(coordinator.name(), "readthru");
    /// ```
    pub fn builder<V, S>(store: S) -> CoordinatorBuilder<V, S>
    where
        S: CacheStore,
    {
        CoordinatorBuilder::new(store)
    }

    /// Creates a builder for a coordinator in front of a fresh, unbounded [`InMemoryStore`].
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn builder_memory<V>() -> CoordinatorBuilder<V, InMemoryStore> {
        CoordinatorBuilder::new(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use readthru_store::testing::MockStore;

    use super::*;
    use crate::BincodeCodec;

    #[test]
    fn defaults() {
        let coordinator: Coordinator<u64, _> = Coordinator::builder(MockStore::new()).build();
        assert_eq!(coordinator.name(), "readthru");
    }

    #[test]
    fn name_accepts_owned_strings() {
        let coordinator: Coordinator<u64, _, _> = Coordinator::builder(MockStore::new())
            .codec(BincodeCodec)
            .name(format!("crimes-{}", 2))
            .build();
        assert_eq!(coordinator.name(), "crimes-2");
    }
}
