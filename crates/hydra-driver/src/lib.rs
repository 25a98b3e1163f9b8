//! Storage driver contract for hydra persisted collections.
//!
//! A driver owns the durable copy of a collection. The collections in
//! `hydra-collections` keep an in-memory working copy and delegate every
//! load, save and erase to a [`StorageDriver`]. Drivers may also announce
//! changes made by someone else (another process, a file watcher) through an
//! [`UpdateStream`].
//!
//! # Provided Pieces
//!
//! - [`StorageDriver`] -- the async trait every backend implements
//! - [`Codec`] -- byte serializer seam, with [`JsonCodec`] and [`BincodeCodec`]
//! - [`MemoryDriver`] -- byte-backed in-memory driver for tests and embedding
//!
//! # Driver Rules
//!
//! 1. `init` may be called more than once and must tolerate it.
//! 2. `store` replaces the whole durable state; there are no partial writes.
//! 3. `hydrate` returns `Ok(None)` when nothing has been stored yet.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod error;
pub mod memory;
pub mod traits;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use error::{DriverError, DriverResult};
pub use memory::{DriverStats, MemoryDriver};
pub use traits::{StorageDriver, UpdateStream};
