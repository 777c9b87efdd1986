use std::error::Error as StdError;
use std::fmt::Debug;

use thiserror::Error;

/// Boxed source error attached to failures reported by collaborators.
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur when building a [`PoolRegistry`][crate::PoolRegistry].
///
/// All of these are fatal at startup - no partially initialized registry is ever returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Two configuration entries share the same key.
    #[error("duplicate pool key in configuration: {key}")]
    DuplicateKey {
        /// Debug rendering of the key that appeared more than once.
        key: String,
    },

    /// The configured initial capacity is larger than the configured slot limit.
    #[error(
        "pool {key} is configured with initial capacity {initial_capacity} \
         which exceeds its slot limit of {max_slots}"
    )]
    InitialCapacityExceedsLimit {
        /// Debug rendering of the misconfigured key.
        key: String,

        /// The requested number of eagerly constructed slots.
        initial_capacity: usize,

        /// The configured slot limit.
        max_slots: usize,
    },

    /// The factory failed while eagerly filling a pool to its initial capacity.
    #[error("failed to fill pool {key} to its initial capacity")]
    Construction {
        /// Debug rendering of the key whose factory failed.
        key: String,

        /// The failure reported by the factory.
        #[source]
        source: ConstructionError,
    },
}

/// Errors returned by per-call pool operations.
///
/// A failed operation never changes which slots of the affected pool are in use.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The operation referenced a key that was never registered.
    #[error("no pool is registered for key {key}")]
    UnknownKey {
        /// Debug rendering of the unknown key.
        key: String,
    },

    /// The handle does not match the current occupancy of its slot.
    ///
    /// This happens when the slot has since been released and re-acquired, when the handle
    /// addresses a slot that does not exist, when the slot has already been released or when the
    /// handle was issued by a different registry.
    #[error("handle for pool {key} slot {index} generation {generation} is not valid")]
    InvalidHandle {
        /// Debug rendering of the key the handle refers to.
        key: String,

        /// The slot index carried by the handle.
        index: usize,

        /// The generation carried by the handle.
        generation: u64,
    },

    /// The pool has reached its configured slot limit and no slot is free.
    #[error("pool {key} is exhausted: all {max_slots} slots are in use")]
    PoolExhausted {
        /// Debug rendering of the exhausted key.
        key: String,

        /// The configured slot limit.
        max_slots: usize,
    },

    /// The pooled instance does not expose the requested feature.
    #[error("pooled instance does not expose feature '{feature}'")]
    FeatureNotFound {
        /// The feature identifier that was requested.
        feature: String,
    },

    /// The factory failed to construct a new instance while growing the pool.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The pooled instance rejected a placement.
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// A [`Factory`][crate::Factory] could not construct a new instance.
#[derive(Debug, Error)]
#[error("failed to construct pooled instance: {message}")]
pub struct ConstructionError {
    message: String,

    #[source]
    source: Option<BoxedSource>,
}

impl ConstructionError {
    /// Creates a construction error with a human-readable description of the problem.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a construction error caused by another error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable description of the problem.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A pooled instance could not apply a placement.
#[derive(Debug, Error)]
#[error("failed to apply placement: {message}")]
pub struct PlacementError {
    message: String,

    #[source]
    source: Option<BoxedSource>,
}

impl PlacementError {
    /// Creates a placement error with a human-readable description of the problem.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a placement error caused by another error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable description of the problem.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Renders a key for inclusion in an error. Keys are only required to be [`Debug`], so that is
/// what we use, which also keeps the error types free of the key type parameter.
pub(crate) fn describe_key<K: Debug>(key: &K) -> String {
    format!("{key:?}")
}
