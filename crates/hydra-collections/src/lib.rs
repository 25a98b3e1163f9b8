//! Persisted collections that hydrate lazily from a storage driver.
//!
//! Each collection looks like a plain in-memory collection, but the first
//! operation loads it from a [`StorageDriver`] and every mutation is written
//! back. All three are thin adapters over a shared
//! [`Controller`](hydra_core::Controller).
//!
//! # Collections
//!
//! - [`PersistedMap`] -- key/value map over a `HashMap`
//! - [`PersistedSet`] -- set of distinct values over a `HashSet`
//! - [`KeyedSet`] -- map-like lookup over a `HashSet`, keyed by a field of
//!   each value compared through a [`KeyProjection`]
//!
//! # Design Rules
//!
//! 1. Every operation hydrates first; hydration happens once per epoch.
//! 2. Mutations change the working copy, then persist it in the same
//!    critical section. A failed persist does not roll the mutation back.
//! 3. Batch deletes persist exactly once and report whether anything was
//!    removed.
//! 4. Driver errors reach the caller unchanged.

pub mod error;
pub mod keyed;
pub mod map;
pub mod set;
pub mod traits;

pub use error::{CollectionError, CollectionResult};
pub use keyed::{IntoPrimitive, KeyProjection, KeyedSet, Primitive};
pub use map::PersistedMap;
pub use set::PersistedSet;
pub use traits::{PersistedMapLike, PersistedSequence, Snapshot};

// Re-export the pieces needed to build a collection.
pub use hydra_core::{Controller, CoreLogMap, CoreOptions, ListenerId, LogLevel};
pub use hydra_driver::{
    BincodeCodec, Codec, DriverError, DriverResult, JsonCodec, MemoryDriver, StorageDriver,
};
