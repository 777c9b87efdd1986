// A poisoned pool lock means slot bookkeeping may be half-updated. We cannot tell which slots are
// really in use any more, so we refuse to continue (we panic).
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned pool lock - slot bookkeeping \
    may be inconsistent and handle validity can no longer be guaranteed";
