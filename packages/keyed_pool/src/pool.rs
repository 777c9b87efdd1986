use std::cell::RefCell;
use std::fmt::Debug;
use std::num::NonZero;
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::constants::ERR_POISONED_LOCK;
use crate::error::describe_key;
use crate::factory::BoxedFactory;
use crate::{ConfigError, Handle, PoolConfig, PoolError, PoolStats, Slot};

thread_local! {
    // Addresses of the pools whose lock is currently held by this thread.
    static HELD_POOLS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// The slots of one key, plus the factory used to grow them.
///
/// The slot sequence is append-only: slots are never removed or reordered, so a slot index in a
/// handle stays meaningful for the lifetime of the pool.
///
/// All slot bookkeeping happens under one mutex per pool. The factory is always invoked without
/// holding that mutex, so slow construction does not block acquire and release calls made by
/// other threads on the same key.
#[derive(derive_more::Debug)]
pub(crate) struct Pool<K, T> {
    key: K,

    /// Identifies the registry that owns this pool. Handles issued by other registries carry a
    /// different value and are rejected.
    registry_id: u64,

    initial_capacity: usize,

    /// `None` means the pool grows without bound, which is the default.
    max_slots: Option<NonZero<usize>>,

    #[debug(ignore)]
    factory: BoxedFactory<K, T>,

    #[debug(ignore)]
    slots: Mutex<Vec<Slot<T>>>,
}

impl<K, T> Pool<K, T> {
    /// Number of in-use slots, for use while the owning registry is being dropped.
    ///
    /// A poisoned lock is tolerated here because we only read the flags.
    #[must_use]
    pub(crate) fn in_use_at_teardown(&mut self) -> usize {
        self.slots
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| slot.is_active())
            .count()
    }
}

impl<K, T> Pool<K, T>
where
    K: Clone + Debug,
{
    /// Creates the pool for the registry `registry_id` and eagerly constructs its initial slots.
    ///
    /// # Errors
    ///
    /// Fails if the initial capacity exceeds the slot limit or if the factory fails to construct
    /// any of the initial instances.
    pub(crate) fn new(config: PoolConfig<K, T>, registry_id: u64) -> Result<Self, ConfigError> {
        let (key, initial_capacity, max_slots, factory) = config.into_parts();

        if let Some(max_slots) = max_slots.filter(|max_slots| initial_capacity > max_slots.get()) {
            return Err(ConfigError::InitialCapacityExceedsLimit {
                key: describe_key(&key),
                initial_capacity,
                max_slots: max_slots.get(),
            });
        }

        let slots = (0..initial_capacity)
            .map(|_| factory.construct(&key).map(Slot::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::Construction {
                key: describe_key(&key),
                source,
            })?;

        info!(
            key = ?key,
            registry_id,
            initial_capacity,
            max_slots = max_slots.map(NonZero::get),
            "created pool"
        );

        Ok(Self {
            key,
            registry_id,
            initial_capacity,
            max_slots,
            factory,
            slots: Mutex::new(slots),
        })
    }

    #[must_use]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// Acquires the first free slot, growing the pool by one slot if none is free.
    pub(crate) fn acquire(&self) -> Result<Handle<K>, PoolError> {
        self.acquire_with(|_| Ok(())).map(|(handle, ())| handle)
    }

    /// Acquires the first free slot (growing the pool by one slot if none is free) and prepares
    /// the instance with `prepare` before marking the slot as in use.
    ///
    /// If `prepare` fails, the error is returned and the pool is left as it was: an existing slot
    /// stays free and a newly constructed instance is discarded instead of being added. The
    /// callback runs while the pool lock is held.
    pub(crate) fn acquire_with<R>(
        &self,
        prepare: impl FnOnce(&mut T) -> Result<R, PoolError>,
    ) -> Result<(Handle<K>, R), PoolError> {
        {
            let mut slots = self.lock();

            if let Some((index, slot)) = first_free(&mut slots) {
                return self.occupy_with(index, slot, prepare);
            }

            if !self.can_grow(slots.len()) {
                return Err(self.exhausted());
            }
        }

        // Construction may be slow, so we do not hold the lock while the factory works. Other
        // threads may free or append slots in the meantime, which is why we check again below.
        let instance = self.factory.construct(&self.key)?;

        // Whatever ends up here is dropped outside the lock, as destroying an instance may be as
        // slow as building one.
        let mut discarded = None;

        let result = {
            let mut slots = self.lock();

            if let Some((index, slot)) = first_free(&mut slots) {
                // Another thread released a slot while we were constructing.
                debug!(key = ?self.key, "slot freed during growth, discarding instance");
                discarded = Some(instance);
                self.occupy_with(index, slot, prepare)
            } else if self.can_grow(slots.len()) {
                let mut slot = Slot::new(instance);

                match self.occupy_with(slots.len(), &mut slot, prepare) {
                    Ok(occupied) => {
                        slots.push(slot);
                        debug!(key = ?self.key, slots = slots.len(), "grew pool");
                        Ok(occupied)
                    }
                    Err(error) => {
                        discarded = Some(slot.into_instance());
                        Err(error)
                    }
                }
            } else {
                // Another thread grew the pool to its limit while we were constructing.
                warn!(key = ?self.key, "slot limit reached during growth, discarding instance");
                discarded = Some(instance);
                Err(self.exhausted())
            }
        };

        drop(discarded);

        result
    }

    fn occupy_with<R>(
        &self,
        index: usize,
        slot: &mut Slot<T>,
        prepare: impl FnOnce(&mut T) -> Result<R, PoolError>,
    ) -> Result<(Handle<K>, R), PoolError> {
        let prepared = prepare(slot.instance_mut())?;
        let generation = slot.occupy();

        Ok((
            Handle::new(self.registry_id, self.key.clone(), index, generation),
            prepared,
        ))
    }

    /// Returns the slot of `handle` to the free state.
    ///
    /// Releasing a slot that is already free is a no-op as long as the handle generation still
    /// matches, i.e. the slot has not been acquired again since.
    pub(crate) fn release(&self, handle: &Handle<K>) -> Result<(), PoolError> {
        if !self.issued(handle) {
            return Err(self.invalid_handle(handle));
        }

        let mut slots = self.lock();

        match slots.get_mut(handle.index()) {
            Some(slot) if slot.matches(handle.generation()) => {
                slot.vacate();
                Ok(())
            }
            _ => Err(self.invalid_handle(handle)),
        }
    }

    /// Forces every slot of the pool back to the free state.
    pub(crate) fn release_all(&self) {
        let mut slots = self.lock();

        let mut released = 0_usize;

        for slot in slots.iter_mut().filter(|slot| slot.is_active()) {
            slot.vacate();
            released = released.wrapping_add(1);
        }

        debug!(key = ?self.key, released, "released all slots");
    }

    /// Calls `f` with the instance behind `handle`, which must refer to an in-use slot.
    pub(crate) fn with_instance<R>(
        &self,
        handle: &Handle<K>,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, PoolError> {
        if !self.issued(handle) {
            return Err(self.invalid_handle(handle));
        }

        let slots = self.lock();

        match slots.get(handle.index()) {
            Some(slot) if slot.is_active() && slot.matches(handle.generation()) => {
                Ok(f(slot.instance()))
            }
            _ => Err(self.invalid_handle(handle)),
        }
    }

    /// Calls `f` with exclusive access to the instance behind `handle`, which must refer to an
    /// in-use slot.
    pub(crate) fn with_instance_mut<R>(
        &self,
        handle: &Handle<K>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, PoolError> {
        if !self.issued(handle) {
            return Err(self.invalid_handle(handle));
        }

        let mut slots = self.lock();

        match slots.get_mut(handle.index()) {
            Some(slot) if slot.is_active() && slot.matches(handle.generation()) => {
                Ok(f(slot.instance_mut()))
            }
            _ => Err(self.invalid_handle(handle)),
        }
    }

    /// Whether `handle` refers to the current occupancy of an in-use slot of this pool.
    #[must_use]
    pub(crate) fn is_valid(&self, handle: &Handle<K>) -> bool {
        self.issued(handle)
            && self
                .lock()
                .get(handle.index())
                .is_some_and(|slot| slot.is_active() && slot.matches(handle.generation()))
    }

    #[must_use]
    pub(crate) fn stats(&self) -> PoolStats {
        let slots = self.lock();

        let in_use = slots.iter().filter(|slot| slot.is_active()).count();

        // Every growth event appends exactly one slot and slots are never removed.
        let growth_events = slots.len().saturating_sub(self.initial_capacity);

        PoolStats::new(slots.len(), in_use, growth_events, self.max_slots)
    }

    /// Whether `handle` was issued by the registry that owns this pool.
    fn issued(&self, handle: &Handle<K>) -> bool {
        handle.registry_id() == self.registry_id
    }

    fn can_grow(&self, current_slots: usize) -> bool {
        self.max_slots
            .is_none_or(|max_slots| current_slots < max_slots.get())
    }

    /// Locks the slots of the pool.
    ///
    /// # Panics
    ///
    /// Panics if the current thread already holds the lock, which happens when a callback that
    /// runs under the lock calls back into the same pool. Waiting for the lock would deadlock.
    fn lock(&self) -> SlotsGuard<'_, T> {
        let held = HeldMarker::enter(ptr::from_ref(self).addr(), &self.key);

        SlotsGuard {
            slots: self.slots.lock().expect(ERR_POISONED_LOCK),
            _held: held,
        }
    }

    fn exhausted(&self) -> PoolError {
        PoolError::PoolExhausted {
            key: describe_key(&self.key),
            max_slots: self.max_slots.map_or(usize::MAX, NonZero::get),
        }
    }

    fn invalid_handle(&self, handle: &Handle<K>) -> PoolError {
        warn!(
            key = ?self.key,
            registry_id = self.registry_id,
            handle_registry_id = handle.registry_id(),
            index = handle.index(),
            generation = handle.generation(),
            "rejected invalid handle"
        );

        PoolError::InvalidHandle {
            key: describe_key(&self.key),
            index: handle.index(),
            generation: handle.generation(),
        }
    }
}

/// The locked slots of a pool. While this exists, the pool is marked as held by the current
/// thread.
struct SlotsGuard<'a, T> {
    // Declared first so the lock is released before the marker is cleared.
    slots: MutexGuard<'a, Vec<Slot<T>>>,
    _held: HeldMarker,
}

impl<T> Deref for SlotsGuard<'_, T> {
    type Target = Vec<Slot<T>>;

    fn deref(&self) -> &Self::Target {
        &self.slots
    }
}

impl<T> DerefMut for SlotsGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.slots
    }
}

/// Records a pool in `HELD_POOLS` for as long as it exists.
struct HeldMarker {
    address: usize,
}

impl HeldMarker {
    fn enter(address: usize, key: &impl Debug) -> Self {
        HELD_POOLS.with_borrow_mut(|held| {
            assert!(
                !held.contains(&address),
                "re-entrant access to pool {key:?} from a callback that runs under its lock"
            );

            held.push(address);
        });

        Self { address }
    }
}

impl Drop for HeldMarker {
    fn drop(&mut self) {
        HELD_POOLS.with_borrow_mut(|held| {
            if let Some(position) = held.iter().rposition(|address| *address == self.address) {
                held.swap_remove(position);
            }
        });
    }
}

/// First-fit scan in insertion order.
fn first_free<T>(slots: &mut [Slot<T>]) -> Option<(usize, &mut Slot<T>)> {
    slots
        .iter_mut()
        .enumerate()
        .find(|(_, slot)| !slot.is_active())
}
