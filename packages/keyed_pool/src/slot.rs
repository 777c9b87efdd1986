/// One managed instance plus its bookkeeping.
///
/// State machine: a slot starts free, becomes in use on `occupy()` and free again on `vacate()`.
/// There is no terminal state - a slot lives as long as its pool.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    instance: T,

    active: bool,

    /// Incremented on every free -> in use transition. Zero means "never acquired".
    generation: u64,
}

impl<T> Slot<T> {
    /// Wraps a freshly constructed instance as a free slot.
    #[must_use]
    pub(crate) fn new(instance: T) -> Self {
        Self {
            instance,
            active: false,
            generation: 0,
        }
    }

    #[must_use]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks the slot as in use and returns the generation of the new occupancy.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already in use.
    pub(crate) fn occupy(&mut self) -> u64 {
        assert!(!self.active, "attempted to occupy a slot that is already in use");

        self.active = true;
        // A wrap would take 2^64 acquisitions of one slot, not a concern in practice.
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Marks the slot as free. Does nothing if it is already free.
    pub(crate) fn vacate(&mut self) {
        self.active = false;
    }

    /// Whether a handle issued with `generation` still refers to the current occupancy.
    #[must_use]
    pub(crate) fn matches(&self, generation: u64) -> bool {
        self.generation == generation
    }

    #[must_use]
    pub(crate) fn instance(&self) -> &T {
        &self.instance
    }

    #[must_use]
    pub(crate) fn instance_mut(&mut self) -> &mut T {
        &mut self.instance
    }

    /// Takes the instance back out of a slot that never made it into a pool.
    #[must_use]
    pub(crate) fn into_instance(self) -> T {
        self.instance
    }
}
