use std::num::NonZero;

/// Point-in-time snapshot of the slot bookkeeping of one pool.
///
/// Returned by [`PoolRegistry::stats()`][crate::PoolRegistry::stats]. The values may be out of
/// date as soon as they are returned if other threads are using the same pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolStats {
    slots: usize,
    in_use: usize,
    growth_events: usize,
    max_slots: Option<NonZero<usize>>,
}

impl PoolStats {
    #[must_use]
    pub(crate) fn new(
        slots: usize,
        in_use: usize,
        growth_events: usize,
        max_slots: Option<NonZero<usize>>,
    ) -> Self {
        Self {
            slots,
            in_use,
            growth_events,
            max_slots,
        }
    }

    /// Total number of slots, free or in use. Never decreases.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of slots currently in use.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Number of free slots.
    #[must_use]
    pub fn free(&self) -> usize {
        // in_use counts a subset of the slots, so this cannot underflow.
        self.slots.saturating_sub(self.in_use)
    }

    /// How many slots were added on demand after the initial fill.
    #[must_use]
    pub fn growth_events(&self) -> usize {
        self.growth_events
    }

    /// The slot limit of the pool, or `None` if it grows without bound.
    #[must_use]
    pub fn max_slots(&self) -> Option<NonZero<usize>> {
        self.max_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_is_slots_minus_in_use() {
        let stats = PoolStats::new(5, 2, 1, None);

        assert_eq!(stats.slots(), 5);
        assert_eq!(stats.in_use(), 2);
        assert_eq!(stats.free(), 3);
        assert_eq!(stats.growth_events(), 1);
        assert_eq!(stats.max_slots(), None);
    }

    #[test]
    fn full_pool_has_no_free_slots() {
        let stats = PoolStats::new(4, 4, 0, NonZero::new(4));

        assert_eq!(stats.free(), 0);
        assert_eq!(stats.max_slots().map(NonZero::get), Some(4));
    }
}
