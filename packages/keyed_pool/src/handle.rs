/// Capability token for one acquired slot of a [`PoolRegistry`][crate::PoolRegistry].
///
/// A handle is returned by the acquire methods and identifies the pool key, the slot position
/// and the occupancy (generation) of that slot at the time of acquisition. Every time a slot is
/// acquired its generation is incremented, so handles from an earlier occupancy of the same slot
/// are rejected with [`PoolError::InvalidHandle`][crate::PoolError::InvalidHandle] instead of
/// touching the new occupant. A handle also remembers which registry issued it and is rejected
/// by every other registry, even one with a pool for the same key.
///
/// Handles carry no behavior and do not release anything when dropped. Dropping a handle without
/// releasing it leaves the slot in use until [`release_all()`][crate::PoolRegistry::release_all]
/// is called for its key.
///
/// # Thread safety
///
/// A handle is [`Send`] and [`Sync`] whenever the key type is, so it can be passed to another
/// thread and released there.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Handle<K> {
    registry_id: u64,
    key: K,
    index: usize,
    generation: u64,
}

impl<K> Handle<K> {
    #[must_use]
    pub(crate) fn new(registry_id: u64, key: K, index: usize, generation: u64) -> Self {
        Self {
            registry_id,
            key,
            index,
            generation,
        }
    }

    #[must_use]
    pub(crate) fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// The key of the pool that owns the slot.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The position of the slot within its pool.
    ///
    /// Slots are never removed or reordered, so the position is stable for the lifetime of the
    /// registry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The occupancy of the slot this handle was issued for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
