/// Determines what happens when a [`PoolRegistry`][crate::PoolRegistry] is dropped while some of
/// its slots are still in use.
///
/// By default, the registry silently drops all instances, in use or not.
///
/// # Examples
///
/// ```
/// use keyed_pool::{ConstructionError, DropPolicy, PoolConfig, PoolRegistry};
///
/// let registry = PoolRegistry::builder()
///     .pool(PoolConfig::new(
///         "bullet",
///         4,
///         |_: &&str| -> Result<u32, ConstructionError> { Ok(0) },
///     ))
///     .drop_policy(DropPolicy::MustNotDropInUse)
///     .build()
///     .unwrap();
///
/// let bullet = registry.acquire("bullet").unwrap();
/// registry.release(&bullet).unwrap();
///
/// // Nothing is in use any more, so dropping the registry does not panic.
/// drop(registry);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The registry drops its instances regardless of slot state. This is the default.
    #[default]
    MayDropInUse,

    /// The registry panics if any slot is still in use when it is dropped.
    ///
    /// This turns forgotten releases into a loud failure at teardown, which may be valuable if
    /// pooled instances guard external resources that callers are expected to hand back
    /// explicitly. The check is skipped if the thread is already panicking.
    MustNotDropInUse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_dropping_in_use() {
        assert_eq!(DropPolicy::default(), DropPolicy::MayDropInUse);
    }
}
