use std::fmt::Debug;
use std::hash::Hash;

use crate::{ConfigError, DropPolicy, PoolConfig, PoolRegistry};

/// Builder for creating an instance of [`PoolRegistry`].
///
/// Pools are created in the order they are added to the builder. At least in principle a
/// registry without any pools is valid, though not very useful.
///
/// # Examples
///
/// ```
/// use keyed_pool::{ConstructionError, DropPolicy, PoolConfig, PoolRegistry};
///
/// fn new_buffer(_: &&str) -> Result<Vec<u8>, ConstructionError> {
///     Ok(vec![0; 1024])
/// }
///
/// let registry = PoolRegistry::builder()
///     .pool(PoolConfig::new("small", 8, new_buffer))
///     .pool(PoolConfig::new("large", 2, new_buffer))
///     .drop_policy(DropPolicy::MayDropInUse)
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.stats("small").unwrap().slots(), 8);
/// ```
#[derive(derive_more::Debug)]
#[must_use]
pub struct PoolRegistryBuilder<K, T> {
    configs: Vec<PoolConfig<K, T>>,
    drop_policy: DropPolicy,
}

impl<K, T> PoolRegistryBuilder<K, T> {
    pub(crate) fn new() -> Self {
        Self {
            configs: Vec::new(),
            drop_policy: DropPolicy::default(),
        }
    }

    /// Adds the configuration of one pool.
    pub fn pool(mut self, config: PoolConfig<K, T>) -> Self {
        self.configs.push(config);
        self
    }

    /// Adds the configurations of multiple pools, in iteration order.
    pub fn pools(mut self, configs: impl IntoIterator<Item = PoolConfig<K, T>>) -> Self {
        self.configs.extend(configs);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the registry. This governs how to treat slots that
    /// are still in use when the registry is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the registry, eagerly constructing the initial instances of every pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKey`] if two pools share a key, in which case no instance
    /// is constructed at all. Returns [`ConfigError::InitialCapacityExceedsLimit`] or
    /// [`ConfigError::Construction`] if any pool cannot be filled to its initial capacity.
    /// No registry is returned if any pool fails.
    pub fn build(self) -> Result<PoolRegistry<K, T>, ConfigError>
    where
        K: Eq + Hash + Clone + Debug,
    {
        PoolRegistry::new_inner(self.configs, self.drop_policy)
    }
}
