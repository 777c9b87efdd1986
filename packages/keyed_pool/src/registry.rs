use std::any::Any;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::error::describe_key;
use crate::{
    ConfigError, DropPolicy, Features, Handle, Place, Pool, PoolConfig, PoolError,
    PoolRegistryBuilder, PoolStats,
};

/// Source of the ids that tie handles to the registry that issued them.
static REGISTRY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn generate_registry_id() -> u64 {
    REGISTRY_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A set of object pools, one per key, that hand out pre-built instances and recycle them.
///
/// The registry is created once from a list of [`PoolConfig`]s and its set of keys is fixed from
/// then on. Each pool starts out with its configured number of eagerly constructed instances and
/// grows by one instance whenever an acquire finds no free slot (up to an optional limit).
/// Released instances are not destroyed or reset - they are kept in their slot and handed out
/// again by a later acquire.
///
/// Acquiring returns a [`Handle`] that identifies the slot. The handle is used to access the
/// instance, to query its features and finally to release it.
///
/// # Thread safety
///
/// The registry is thread-safe ([`Sync`]) when the key type is [`Sync`] and the instance type is
/// [`Send`]. Share it via a reference or an `Arc`. Every pool has its own lock, so operations on
/// different keys never contend with each other. The key-to-pool mapping is never modified after
/// construction and is read without locking.
///
/// Closures passed to the `with_*` methods, as well as [`Place`] and [`Features`] implementations
/// invoked while acquiring, run while the lock of the affected pool is held. Calling back into the
/// same pool from there would deadlock, so it panics instead. Other pools may be used freely.
///
/// # Example
///
/// ```
/// use keyed_pool::{ConstructionError, PoolConfig, PoolRegistry};
///
/// let registry = PoolRegistry::initialize([PoolConfig::new(
///     "bullet",
///     3,
///     |_: &&str| -> Result<String, ConstructionError> { Ok(String::with_capacity(32)) },
/// )])
/// .unwrap();
///
/// let bullet = registry.acquire("bullet").unwrap();
///
/// registry
///     .with_instance_mut(&bullet, |text| text.push_str("pew"))
///     .unwrap();
///
/// registry.release(&bullet).unwrap();
///
/// let stats = registry.stats("bullet").unwrap();
/// assert_eq!(stats.slots(), 3);
/// assert_eq!(stats.in_use(), 0);
/// ```
#[derive(derive_more::Debug)]
pub struct PoolRegistry<K, T> {
    /// In initialization order. Never modified after construction.
    pools: Vec<Pool<K, T>>,

    /// Position of each key's pool in `pools`.
    #[debug(ignore)]
    index_by_key: HashMap<K, usize>,

    drop_policy: DropPolicy,
}

impl<K, T> PoolRegistry<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates a builder for configuring and constructing a [`PoolRegistry`].
    pub fn builder() -> PoolRegistryBuilder<K, T> {
        PoolRegistryBuilder::new()
    }

    /// Creates a registry with one pool per configuration entry, using the default
    /// [`DropPolicy`].
    ///
    /// Pools are created in iteration order and each is eagerly filled with its initial
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKey`] if two entries share a key, in which case no instance
    /// is constructed at all. Returns [`ConfigError::InitialCapacityExceedsLimit`] or
    /// [`ConfigError::Construction`] if any pool cannot be filled to its initial capacity.
    /// No registry is returned if any pool fails.
    pub fn initialize(
        configs: impl IntoIterator<Item = PoolConfig<K, T>>,
    ) -> Result<Self, ConfigError> {
        Self::builder().pools(configs).build()
    }

    pub(crate) fn new_inner(
        configs: Vec<PoolConfig<K, T>>,
        drop_policy: DropPolicy,
    ) -> Result<Self, ConfigError> {
        // Validate all keys before constructing anything, so a duplicate does not cost us a
        // round of potentially expensive construction.
        let mut seen = HashSet::with_capacity(configs.len());

        for config in &configs {
            if !seen.insert(config.key()) {
                return Err(ConfigError::DuplicateKey {
                    key: describe_key(config.key()),
                });
            }
        }

        drop(seen);

        let registry_id = generate_registry_id();

        let mut pools = Vec::with_capacity(configs.len());
        let mut index_by_key = HashMap::with_capacity(configs.len());

        for config in configs {
            let pool = Pool::new(config, registry_id)?;
            index_by_key.insert(pool.key().clone(), pools.len());
            pools.push(pool);
        }

        Ok(Self {
            pools,
            index_by_key,
            drop_policy,
        })
    }

    /// Acquires an instance from the pool of `key`.
    ///
    /// The first free slot in insertion order is used. If no slot is free, one new instance is
    /// constructed via the pool's factory and added as a new slot.
    ///
    /// # Errors
    ///
    /// * [`PoolError::UnknownKey`] if no pool is registered for `key`.
    /// * [`PoolError::Construction`] if the pool had to grow and the factory failed.
    /// * [`PoolError::PoolExhausted`] if the pool had to grow but has reached its slot limit.
    ///
    /// The pool is unchanged if an error is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use keyed_pool::{ConstructionError, PoolConfig, PoolRegistry};
    ///
    /// let registry = PoolRegistry::initialize([PoolConfig::new(
    ///     "bullet",
    ///     1,
    ///     |_: &&str| -> Result<u32, ConstructionError> { Ok(0) },
    /// )])
    /// .unwrap();
    ///
    /// let first = registry.acquire("bullet").unwrap();
    /// let second = registry.acquire("bullet").unwrap();
    ///
    /// // The second acquire grew the pool.
    /// assert_eq!(second.index(), 1);
    /// assert_eq!(registry.stats("bullet").unwrap().growth_events(), 1);
    /// # registry.release(&first).unwrap();
    /// ```
    pub fn acquire<Q>(&self, key: &Q) -> Result<Handle<K>, PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.pool(key)?.acquire()
    }

    /// Acquires an instance from the pool of `key` and applies `placement` to it before handing
    /// it out.
    ///
    /// # Errors
    ///
    /// Same as [`acquire()`](Self::acquire). In addition, returns [`PoolError::Placement`] if
    /// the instance rejects the placement, in which case its slot is left free.
    ///
    /// # Example
    ///
    /// ```
    /// use keyed_pool::{ConstructionError, Place, PlacementError, PoolConfig, PoolRegistry};
    ///
    /// #[derive(Default)]
    /// struct Bullet {
    ///     position: (i32, i32),
    /// }
    ///
    /// impl Place<(i32, i32)> for Bullet {
    ///     fn place(&mut self, position: (i32, i32)) -> Result<(), PlacementError> {
    ///         self.position = position;
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let registry = PoolRegistry::initialize([PoolConfig::new(
    ///     "bullet",
    ///     2,
    ///     |_: &&str| -> Result<Bullet, ConstructionError> { Ok(Bullet::default()) },
    /// )])
    /// .unwrap();
    ///
    /// let bullet = registry.acquire_at("bullet", (10, -4)).unwrap();
    ///
    /// let position = registry
    ///     .with_instance(&bullet, |bullet| bullet.position)
    ///     .unwrap();
    /// assert_eq!(position, (10, -4));
    /// ```
    pub fn acquire_at<Q, P>(&self, key: &Q, placement: P) -> Result<Handle<K>, PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
        T: Place<P>,
    {
        let (handle, ()) = self
            .pool(key)?
            .acquire_with(|instance| instance.place(placement).map_err(PoolError::from))?;

        Ok(handle)
    }

    /// Acquires an instance from the pool of `key` and lends its feature `feature` to `f`.
    ///
    /// Returns the handle of the acquired instance together with the value returned by `f`.
    ///
    /// # Errors
    ///
    /// Same as [`acquire()`](Self::acquire). In addition, returns
    /// [`PoolError::FeatureNotFound`] if the instance does not expose the feature, in which case
    /// its slot is left free.
    pub fn acquire_with_feature<Q, R>(
        &self,
        key: &Q,
        feature: &str,
        f: impl FnOnce(&mut dyn Any) -> R,
    ) -> Result<(Handle<K>, R), PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
        T: Features,
    {
        self.pool(key)?.acquire_with(|instance| {
            instance
                .feature_mut(feature)
                .map(f)
                .ok_or_else(|| feature_not_found(feature))
        })
    }

    /// Returns the slot of `handle` to its pool.
    ///
    /// The instance itself is kept as-is and will be handed out again by a later acquire.
    /// Releasing an already released handle is a no-op, as long as the slot has not been
    /// acquired again in the meantime.
    ///
    /// # Errors
    ///
    /// * [`PoolError::UnknownKey`] if the handle refers to a key that is not registered here.
    /// * [`PoolError::InvalidHandle`] if the slot has been acquired again since the handle was
    ///   issued, the handle does not address an existing slot or the handle was issued by another
    ///   registry.
    pub fn release(&self, handle: &Handle<K>) -> Result<(), PoolError> {
        self.pool(handle.key())?.release(handle)
    }

    /// Returns every slot of the pool of `key` to the free state, regardless of who holds it.
    ///
    /// Meant for bulk reset points, such as the end of a level or session. Outstanding handles
    /// for the pool can no longer be used to access their instances afterwards. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownKey`] if no pool is registered for `key`.
    pub fn release_all<Q>(&self, key: &Q) -> Result<(), PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.pool(key)?.release_all();
        Ok(())
    }

    /// Calls `f` with a shared reference to the instance behind `handle`.
    ///
    /// # Errors
    ///
    /// * [`PoolError::UnknownKey`] if the handle refers to a key that is not registered here.
    /// * [`PoolError::InvalidHandle`] if the handle is not [valid][Self::is_valid].
    pub fn with_instance<R>(
        &self,
        handle: &Handle<K>,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, PoolError> {
        self.pool(handle.key())?.with_instance(handle, f)
    }

    /// Calls `f` with an exclusive reference to the instance behind `handle`.
    ///
    /// # Errors
    ///
    /// * [`PoolError::UnknownKey`] if the handle refers to a key that is not registered here.
    /// * [`PoolError::InvalidHandle`] if the handle is not [valid][Self::is_valid].
    pub fn with_instance_mut<R>(
        &self,
        handle: &Handle<K>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, PoolError> {
        self.pool(handle.key())?.with_instance_mut(handle, f)
    }

    /// Calls `f` with the feature `feature` of the instance behind `handle`.
    ///
    /// # Errors
    ///
    /// * [`PoolError::UnknownKey`] if the handle refers to a key that is not registered here.
    /// * [`PoolError::InvalidHandle`] if the handle is not [valid][Self::is_valid].
    /// * [`PoolError::FeatureNotFound`] if the instance does not expose the feature.
    ///
    /// # Example
    ///
    /// ```
    /// use std::any::Any;
    ///
    /// use keyed_pool::{ConstructionError, Features, PoolConfig, PoolError, PoolRegistry};
    ///
    /// struct Enemy {
    ///     health: u32,
    /// }
    ///
    /// impl Features for Enemy {
    ///     fn feature(&self, id: &str) -> Option<&dyn Any> {
    ///         (id == "health").then_some(&self.health as &dyn Any)
    ///     }
    ///
    ///     fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any> {
    ///         (id == "health").then_some(&mut self.health as &mut dyn Any)
    ///     }
    /// }
    ///
    /// let registry = PoolRegistry::initialize([PoolConfig::new(
    ///     "enemy",
    ///     1,
    ///     |_: &&str| -> Result<Enemy, ConstructionError> { Ok(Enemy { health: 100 }) },
    /// )])
    /// .unwrap();
    ///
    /// let enemy = registry.acquire("enemy").unwrap();
    ///
    /// let health = registry
    ///     .with_feature(&enemy, "health", |health| health.downcast_ref::<u32>().copied())
    ///     .unwrap();
    /// assert_eq!(health, Some(100));
    ///
    /// let missing = registry.with_feature(&enemy, "shield", |_| ());
    /// assert!(matches!(missing, Err(PoolError::FeatureNotFound { .. })));
    /// ```
    pub fn with_feature<R>(
        &self,
        handle: &Handle<K>,
        feature: &str,
        f: impl FnOnce(&dyn Any) -> R,
    ) -> Result<R, PoolError>
    where
        T: Features,
    {
        self.pool(handle.key())?
            .with_instance(handle, |instance| {
                instance
                    .feature(feature)
                    .map(f)
                    .ok_or_else(|| feature_not_found(feature))
            })?
    }

    /// Calls `f` with exclusive access to the feature `feature` of the instance behind `handle`.
    ///
    /// # Errors
    ///
    /// Same as [`with_feature()`](Self::with_feature).
    pub fn with_feature_mut<R>(
        &self,
        handle: &Handle<K>,
        feature: &str,
        f: impl FnOnce(&mut dyn Any) -> R,
    ) -> Result<R, PoolError>
    where
        T: Features,
    {
        self.pool(handle.key())?
            .with_instance_mut(handle, |instance| {
                instance
                    .feature_mut(feature)
                    .map(f)
                    .ok_or_else(|| feature_not_found(feature))
            })?
    }

    /// Whether `handle` can still be used to access its instance.
    ///
    /// This is the case if the handle was issued by this registry, the slot has not been released
    /// and it has not been acquired again since the handle was issued.
    #[must_use]
    pub fn is_valid(&self, handle: &Handle<K>) -> bool {
        self.pool(handle.key())
            .is_ok_and(|pool| pool.is_valid(handle))
    }

    /// Returns a snapshot of the slot bookkeeping of the pool of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownKey`] if no pool is registered for `key`.
    pub fn stats<Q>(&self, key: &Q) -> Result<PoolStats, PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        Ok(self.pool(key)?.stats())
    }

    /// The registered keys, in initialization order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.pools.iter().map(Pool::key)
    }

    /// Whether a pool is registered for `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_by_key.contains_key(key)
    }

    fn pool<Q>(&self, key: &Q) -> Result<&Pool<K, T>, PoolError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.index_by_key
            .get(key)
            .and_then(|index| self.pools.get(*index))
            .ok_or_else(|| PoolError::UnknownKey {
                key: describe_key(&key),
            })
    }
}

impl<K, T> Drop for PoolRegistry<K, T> {
    fn drop(&mut self) {
        if self.drop_policy != DropPolicy::MustNotDropInUse || thread::panicking() {
            return;
        }

        let in_use = self
            .pools
            .iter_mut()
            .map(Pool::in_use_at_teardown)
            .fold(0_usize, usize::saturating_add);

        assert!(
            in_use == 0,
            "dropped PoolRegistry with {in_use} slots still in use, which is forbidden by DropPolicy::MustNotDropInUse"
        );
    }
}

fn feature_not_found(feature: &str) -> PoolError {
    PoolError::FeatureNotFound {
        feature: feature.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{ConstructionError, MockFactory, PlacementError};

    assert_impl_all!(PoolRegistry<&'static str, String>: Send, Sync, std::fmt::Debug);
    assert_impl_all!(PoolRegistry<String, Vec<u8>>: Send, Sync);
    assert_not_impl_any!(PoolRegistry<&'static str, std::rc::Rc<u8>>: Send, Sync);

    #[derive(Debug, Default)]
    struct Projectile {
        position: (i32, i32),
        damage: u32,
    }

    impl Place<(i32, i32)> for Projectile {
        fn place(&mut self, position: (i32, i32)) -> Result<(), PlacementError> {
            if position.0 < 0 || position.1 < 0 {
                return Err(PlacementError::new("outside of the arena"));
            }

            self.position = position;
            Ok(())
        }
    }

    impl Features for Projectile {
        fn feature(&self, id: &str) -> Option<&dyn Any> {
            match id {
                "damage" => Some(&self.damage),
                _ => None,
            }
        }

        fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any> {
            match id {
                "damage" => Some(&mut self.damage),
                _ => None,
            }
        }
    }

    fn projectile(_: &&'static str) -> Result<Projectile, ConstructionError> {
        Ok(Projectile::default())
    }

    fn registry() -> PoolRegistry<&'static str, Projectile> {
        PoolRegistry::initialize([
            PoolConfig::new("bullet", 3, projectile),
            PoolConfig::new("rocket", 0, projectile),
        ])
        .unwrap()
    }

    #[test]
    fn initialize_creates_pools_in_order() {
        let registry = registry();

        assert_eq!(registry.keys().copied().collect::<Vec<_>>(), ["bullet", "rocket"]);
        assert!(registry.contains_key("bullet"));
        assert!(!registry.contains_key("laser"));

        assert_eq!(registry.stats("bullet").unwrap().slots(), 3);
        assert_eq!(registry.stats("rocket").unwrap().slots(), 0);
    }

    #[test]
    fn initialize_rejects_duplicate_key_without_constructing() {
        let mut factory = MockFactory::<&'static str, u32>::new();
        factory.expect_construct().never();

        let error = PoolRegistry::initialize([
            PoolConfig::new("bullet", 2, factory),
            PoolConfig::new("rocket", 2, |_: &&'static str| -> Result<u32, ConstructionError> {
                Ok(0)
            }),
            PoolConfig::new("bullet", 1, |_: &&'static str| -> Result<u32, ConstructionError> {
                Ok(0)
            }),
        ])
        .unwrap_err();

        assert!(matches!(error, ConfigError::DuplicateKey { ref key } if key == "\"bullet\""));
    }

    #[test]
    fn initialize_fails_if_any_pool_fails() {
        let error = PoolRegistry::initialize([
            PoolConfig::new("bullet", 1, |_: &&'static str| -> Result<u32, ConstructionError> {
                Ok(0)
            }),
            PoolConfig::new("rocket", 1, |_: &&'static str| -> Result<u32, ConstructionError> {
                Err(ConstructionError::new("no launcher"))
            }),
        ])
        .unwrap_err();

        assert!(matches!(error, ConfigError::Construction { ref key, .. } if key == "\"rocket\""));
    }

    #[test]
    fn acquire_unknown_key_fails_without_side_effects() {
        let registry = registry();

        let error = registry.acquire("unregistered").unwrap_err();
        assert!(matches!(error, PoolError::UnknownKey { .. }));

        assert_eq!(registry.stats("bullet").unwrap().in_use(), 0);
        assert_eq!(registry.stats("rocket").unwrap().slots(), 0);
    }

    #[test]
    fn acquire_routes_to_pool_of_key() {
        let registry = registry();

        let bullet = registry.acquire("bullet").unwrap();
        let rocket = registry.acquire("rocket").unwrap();

        assert_eq!(*bullet.key(), "bullet");
        assert_eq!(*rocket.key(), "rocket");
        assert_eq!(registry.stats("bullet").unwrap().in_use(), 1);
        assert_eq!(registry.stats("rocket").unwrap().in_use(), 1);
        assert_eq!(registry.stats("rocket").unwrap().growth_events(), 1);
    }

    #[test]
    fn acquire_at_applies_placement() {
        let registry = registry();

        let bullet = registry.acquire_at("bullet", (3, 4)).unwrap();

        let position = registry
            .with_instance(&bullet, |projectile| projectile.position)
            .unwrap();
        assert_eq!(position, (3, 4));
    }

    #[test]
    fn acquire_at_rejected_placement_leaves_slot_free() {
        let registry = registry();

        let error = registry.acquire_at("bullet", (-1, 4)).unwrap_err();
        assert!(matches!(error, PoolError::Placement(_)));

        assert_eq!(registry.stats("bullet").unwrap().in_use(), 0);
    }

    #[test]
    fn acquire_at_unknown_key_fails() {
        let registry = registry();

        let error = registry.acquire_at("laser", (1, 1)).unwrap_err();
        assert!(matches!(error, PoolError::UnknownKey { .. }));
    }

    #[test]
    fn acquire_with_feature_lends_feature() {
        let registry = registry();

        let (handle, ()) = registry
            .acquire_with_feature("bullet", "damage", |damage| {
                if let Some(damage) = damage.downcast_mut::<u32>() {
                    *damage = 25;
                }
            })
            .unwrap();

        let damage = registry
            .with_instance(&handle, |projectile| projectile.damage)
            .unwrap();
        assert_eq!(damage, 25);
    }

    #[test]
    fn acquire_with_missing_feature_leaves_slot_free() {
        let registry = registry();

        let error = registry
            .acquire_with_feature("bullet", "shield", |_| ())
            .unwrap_err();

        assert!(matches!(error, PoolError::FeatureNotFound { ref feature } if feature == "shield"));
        assert_eq!(registry.stats("bullet").unwrap().in_use(), 0);
    }

    #[test]
    fn with_feature_reads_and_writes_feature() {
        let registry = registry();
        let bullet = registry.acquire("bullet").unwrap();

        registry
            .with_feature_mut(&bullet, "damage", |damage| {
                if let Some(damage) = damage.downcast_mut::<u32>() {
                    *damage = 7;
                }
            })
            .unwrap();

        let damage = registry
            .with_feature(&bullet, "damage", |damage| damage.downcast_ref::<u32>().copied())
            .unwrap();
        assert_eq!(damage, Some(7));

        let error = registry.with_feature(&bullet, "armor", |_| ()).unwrap_err();
        assert!(matches!(error, PoolError::FeatureNotFound { .. }));
    }

    #[test]
    fn with_feature_rejects_released_handle() {
        let registry = registry();
        let bullet = registry.acquire("bullet").unwrap();
        registry.release(&bullet).unwrap();

        let error = registry.with_feature(&bullet, "damage", |_| ()).unwrap_err();
        assert!(matches!(error, PoolError::InvalidHandle { .. }));
    }

    #[test]
    fn release_handle_from_other_registry_with_unknown_key_fails() {
        let registry = registry();

        let other = PoolRegistry::initialize([PoolConfig::new("laser", 1, projectile)]).unwrap();
        let laser = other.acquire("laser").unwrap();

        let error = registry.release(&laser).unwrap_err();
        assert!(matches!(error, PoolError::UnknownKey { .. }));
        assert!(!registry.is_valid(&laser));
    }

    #[test]
    fn handle_from_other_registry_with_same_key_is_rejected() {
        let ours = registry();
        let theirs = registry();

        let our_bullet = ours.acquire("bullet").unwrap();
        let their_bullet = theirs.acquire("bullet").unwrap();
        assert_eq!(our_bullet.index(), their_bullet.index());

        let error = ours.release(&their_bullet).unwrap_err();
        assert!(matches!(error, PoolError::InvalidHandle { .. }));

        let error = ours
            .with_feature(&their_bullet, "damage", |_| ())
            .unwrap_err();
        assert!(matches!(error, PoolError::InvalidHandle { .. }));

        assert!(!ours.is_valid(&their_bullet));
        assert!(ours.is_valid(&our_bullet));
        assert!(theirs.is_valid(&their_bullet));
        assert_eq!(ours.stats("bullet").unwrap().in_use(), 1);
    }

    #[test]
    fn acquire_at_rejected_placement_does_not_grow() {
        let registry = registry();

        let error = registry.acquire_at("rocket", (-1, 0)).unwrap_err();
        assert!(matches!(error, PoolError::Placement(_)));

        let stats = registry.stats("rocket").unwrap();
        assert_eq!(stats.slots(), 0);
        assert_eq!(stats.growth_events(), 0);
    }

    #[test]
    fn acquire_with_missing_feature_does_not_grow() {
        let registry = registry();

        registry
            .acquire_with_feature("rocket", "shield", |_| ())
            .unwrap_err();

        assert_eq!(registry.stats("rocket").unwrap().slots(), 0);
    }

    #[test]
    #[should_panic(expected = "re-entrant access to pool")]
    fn callback_into_same_pool_panics() {
        let registry = registry();
        let bullet = registry.acquire("bullet").unwrap();

        registry
            .with_instance(&bullet, |_| registry.release(&bullet))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn callback_into_other_pool_is_allowed() {
        let registry = registry();
        let bullet = registry.acquire("bullet").unwrap();

        let rocket = registry
            .with_instance(&bullet, |_| registry.acquire("rocket"))
            .unwrap()
            .unwrap();

        assert!(registry.is_valid(&rocket));
        assert_eq!(registry.stats("rocket").unwrap().in_use(), 1);
    }

    #[test]
    fn release_all_is_scoped_to_key() {
        let registry = registry();

        let bullet = registry.acquire("bullet").unwrap();
        let rocket = registry.acquire("rocket").unwrap();

        registry.release_all("bullet").unwrap();
        registry.release_all("bullet").unwrap();

        assert!(!registry.is_valid(&bullet));
        assert!(registry.is_valid(&rocket));
        assert_eq!(registry.stats("bullet").unwrap().in_use(), 0);
        assert_eq!(registry.stats("rocket").unwrap().in_use(), 1);
    }

    #[test]
    fn release_all_unknown_key_fails() {
        let registry = registry();

        let error = registry.release_all("laser").unwrap_err();
        assert!(matches!(error, PoolError::UnknownKey { .. }));
    }

    #[test]
    fn string_keys_can_be_looked_up_by_str() {
        let registry = PoolRegistry::initialize([PoolConfig::new(
            "bullet".to_string(),
            1,
            |_: &String| -> Result<u32, ConstructionError> { Ok(0) },
        )])
        .unwrap();

        let handle = registry.acquire("bullet").unwrap();
        assert_eq!(handle.key(), "bullet");
        registry.release(&handle).unwrap();
    }

    #[test]
    fn slot_limit_applies_per_key() {
        let registry = PoolRegistry::initialize([
            PoolConfig::new("bullet", 1, projectile).with_max_slots(NonZero::new(1).unwrap()),
            PoolConfig::new("rocket", 1, projectile),
        ])
        .unwrap();

        let _bullet = registry.acquire("bullet").unwrap();
        let error = registry.acquire("bullet").unwrap_err();
        assert!(matches!(error, PoolError::PoolExhausted { max_slots: 1, .. }));

        let _rocket1 = registry.acquire("rocket").unwrap();
        let _rocket2 = registry.acquire("rocket").unwrap();
        assert_eq!(registry.stats("rocket").unwrap().slots(), 2);
    }

    #[test]
    fn growth_uses_factory_of_key() {
        let bullets_built = Arc::new(AtomicUsize::new(0));
        let rockets_built = Arc::new(AtomicUsize::new(0));

        let counter = |count: &Arc<AtomicUsize>| {
            let count = Arc::clone(count);
            move |_: &&'static str| -> Result<u32, ConstructionError> {
                count.fetch_add(1, Ordering::Relaxed);
                Ok(0)
            }
        };

        let registry = PoolRegistry::initialize([
            PoolConfig::new("bullet", 2, counter(&bullets_built)),
            PoolConfig::new("rocket", 0, counter(&rockets_built)),
        ])
        .unwrap();

        assert_eq!(bullets_built.load(Ordering::Relaxed), 2);
        assert_eq!(rockets_built.load(Ordering::Relaxed), 0);

        let _rocket = registry.acquire("rocket").unwrap();

        assert_eq!(bullets_built.load(Ordering::Relaxed), 2);
        assert_eq!(rockets_built.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn drop_with_in_use_slots_is_allowed_by_default() {
        let registry = registry();
        let _bullet = registry.acquire("bullet").unwrap();

        drop(registry);
    }

    #[test]
    #[should_panic]
    fn drop_with_in_use_slots_panics_if_forbidden() {
        let registry = PoolRegistry::builder()
            .pool(PoolConfig::new("bullet", 1, projectile))
            .drop_policy(DropPolicy::MustNotDropInUse)
            .build()
            .unwrap();

        let _bullet = registry.acquire("bullet").unwrap();

        drop(registry);
    }

    #[test]
    fn drop_after_release_all_is_allowed_if_in_use_forbidden() {
        let registry = PoolRegistry::builder()
            .pool(PoolConfig::new("bullet", 1, projectile))
            .drop_policy(DropPolicy::MustNotDropInUse)
            .build()
            .unwrap();

        let _bullet = registry.acquire("bullet").unwrap();
        registry.release_all("bullet").unwrap();

        drop(registry);
    }
}
