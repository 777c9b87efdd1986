//! Keyed object pools that hand out pre-built instances and recycle them on release.
//!
//! This crate provides [`PoolRegistry`], a set of object pools identified by key. Each pool is
//! eagerly filled with instances built by a [`Factory`] when the registry is created, so that
//! latency-sensitive code can acquire a ready-to-use instance instead of constructing one. When
//! the caller is done with an instance it releases it back to its pool, where it waits to be
//! handed out again. Instances are never destroyed before the registry itself.
//!
//! # Key Features
//!
//! - **Growth on exhaustion**: if all slots of a pool are in use, acquiring constructs one more
//!   instance. The initial capacity is a starting point, not a limit.
//! - **Optional slot limit**: [`PoolConfig::with_max_slots()`] turns exhaustion into a
//!   [`PoolError::PoolExhausted`] error instead of growth.
//! - **First-fit reuse**: the free slot with the lowest index is always handed out first.
//! - **Generation-checked handles**: a [`Handle`] from an earlier occupancy of a slot, or one
//!   issued by another registry, is rejected instead of touching the instance's current user.
//! - **Capability queries**: instances can expose named [`Features`] and accept a placement via
//!   [`Place`], without the pool knowing anything about either.
//! - **Thread safety**: one lock per key, no registry-wide lock, and instance construction never
//!   happens while a lock is held.
//!
//! # Example
//!
//! ```rust
//! use keyed_pool::{ConstructionError, PoolConfig, PoolRegistry};
//!
//! #[derive(Debug, Default)]
//! struct Bullet {
//!     speed: f32,
//! }
//!
//! fn new_bullet(_key: &&str) -> Result<Bullet, ConstructionError> {
//!     Ok(Bullet::default())
//! }
//!
//! let registry = PoolRegistry::initialize([PoolConfig::new("bullet", 3, new_bullet)]).unwrap();
//!
//! // Three instances were built up front, so these do not construct anything.
//! let first = registry.acquire("bullet").unwrap();
//! let _second = registry.acquire("bullet").unwrap();
//! let _third = registry.acquire("bullet").unwrap();
//! assert_eq!(registry.stats("bullet").unwrap().slots(), 3);
//!
//! // The pool is exhausted, so it grows by one instance.
//! let fourth = registry.acquire("bullet").unwrap();
//! assert_eq!(fourth.index(), 3);
//! assert_eq!(registry.stats("bullet").unwrap().slots(), 4);
//!
//! // Released slots are reused before any later slot.
//! registry.release(&first).unwrap();
//! let again = registry.acquire("bullet").unwrap();
//! assert_eq!(again.index(), first.index());
//!
//! // The old handle no longer grants access to the slot.
//! assert!(registry.release(&first).is_err());
//! ```

mod builder;
mod capabilities;
mod config;
mod constants;
mod drop_policy;
mod error;
mod factory;
mod handle;
mod pool;
mod registry;
mod slot;
mod stats;

pub use builder::*;
pub use capabilities::*;
pub use config::*;
pub use drop_policy::*;
pub use error::*;
pub use factory::*;
pub use handle::*;
pub(crate) use pool::*;
pub use registry::*;
pub(crate) use slot::*;
pub use stats::*;
