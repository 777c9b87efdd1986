use crate::ConstructionError;

/// Constructs new baseline instances for one pool.
///
/// The pool calls the factory once per slot it needs: `initial_capacity` times while the registry
/// is being built and once per growth event afterwards. Every instance returned must be usable
/// right away as a free slot, without further initialization by the pool.
///
/// Growth happens outside the pool lock, so a factory may be invoked concurrently from multiple
/// threads. Pools therefore only accept factories that are `Send + Sync`.
///
/// Any `Fn(&K) -> Result<T, ConstructionError>` closure is a factory.
///
/// # Example
///
/// ```
/// use keyed_pool::{ConstructionError, Factory};
///
/// struct Bullets;
///
/// impl Factory<&'static str, Vec<u8>> for Bullets {
///     fn construct(&self, _key: &&'static str) -> Result<Vec<u8>, ConstructionError> {
///         Ok(Vec::with_capacity(64))
///     }
/// }
///
/// let bullet = Bullets.construct(&"bullet").unwrap();
/// assert!(bullet.capacity() >= 64);
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Factory<K, T> {
    /// Constructs one new instance for `key` in its baseline state.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if an instance cannot be produced. The pool does not retry;
    /// the error is reported to whoever triggered the construction.
    fn construct(&self, key: &K) -> Result<T, ConstructionError>;
}

/// The form in which pools own their factory.
pub(crate) type BoxedFactory<K, T> = Box<dyn Factory<K, T> + Send + Sync>;

impl<K, T, F> Factory<K, T> for F
where
    F: Fn(&K) -> Result<T, ConstructionError>,
{
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn construct(&self, key: &K) -> Result<T, ConstructionError> {
        self(key)
    }
}
