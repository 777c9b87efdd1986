use std::num::NonZero;

use crate::Factory;
use crate::factory::BoxedFactory;

/// Configuration of one pool in a [`PoolRegistry`][crate::PoolRegistry].
///
/// Names the key, the factory that constructs instances for that key and the number of instances
/// to construct eagerly when the registry is built.
///
/// By default a pool grows without bound when it runs out of free slots. Use
/// [`with_max_slots()`](Self::with_max_slots) to put a ceiling on the number of slots.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use keyed_pool::{ConstructionError, PoolConfig};
///
/// let config = PoolConfig::new(
///     "bullet",
///     32,
///     |_: &&str| -> Result<Vec<u8>, ConstructionError> { Ok(Vec::new()) },
/// )
/// .with_max_slots(NonZero::new(256).unwrap());
///
/// assert_eq!(*config.key(), "bullet");
/// assert_eq!(config.initial_capacity(), 32);
/// assert_eq!(config.max_slots().map(NonZero::get), Some(256));
/// ```
#[derive(derive_more::Debug)]
#[must_use]
pub struct PoolConfig<K, T> {
    key: K,
    initial_capacity: usize,
    max_slots: Option<NonZero<usize>>,

    #[debug(ignore)]
    factory: BoxedFactory<K, T>,
}

impl<K, T> PoolConfig<K, T> {
    /// Creates the configuration of an unbounded pool for `key` that is eagerly filled with
    /// `initial_capacity` instances built by `factory`.
    pub fn new(
        key: K,
        initial_capacity: usize,
        factory: impl Factory<K, T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            initial_capacity,
            max_slots: None,
            factory: Box::new(factory),
        }
    }

    /// Limits the pool to at most `max_slots` slots.
    ///
    /// When all slots are in use and the limit has been reached, acquiring from the pool fails
    /// with [`PoolError::PoolExhausted`][crate::PoolError::PoolExhausted].
    pub fn with_max_slots(mut self, max_slots: NonZero<usize>) -> Self {
        self.max_slots = Some(max_slots);
        self
    }

    /// The key of the configured pool.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The number of instances constructed when the registry is built.
    #[must_use]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// The slot limit, or `None` if the pool may grow without bound.
    #[must_use]
    pub fn max_slots(&self) -> Option<NonZero<usize>> {
        self.max_slots
    }

    pub(crate) fn into_parts(self) -> (K, usize, Option<NonZero<usize>>, BoxedFactory<K, T>) {
        (
            self.key,
            self.initial_capacity,
            self.max_slots,
            self.factory,
        )
    }
}
