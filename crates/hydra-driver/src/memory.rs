//! In-memory storage driver for tests and embedding.
//!
//! [`MemoryDriver`] keeps the durable copy as encoded bytes behind a
//! `RwLock`, so every hydrate decodes a fresh value and nothing is ever
//! aliased between the durable and in-memory copies. Cloning a driver yields
//! another handle over the same bytes, which is how tests model "a second
//! process opening the same store".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::codec::Codec;
use crate::error::{DriverError, DriverResult};
use crate::traits::{StorageDriver, UpdateStream};

/// Capacity of the external update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Call counters for a [`MemoryDriver`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub init: u64,
    pub hydrate: u64,
    pub store: u64,
    pub clear: u64,
}

#[derive(Default)]
struct Counters {
    init: AtomicU64,
    hydrate: AtomicU64,
    store: AtomicU64,
    clear: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DriverStats {
        DriverStats {
            init: self.init.load(Ordering::Relaxed),
            hydrate: self.hydrate.load(Ordering::Relaxed),
            store: self.store.load(Ordering::Relaxed),
            clear: self.clear.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.init.store(0, Ordering::Relaxed);
        self.hydrate.store(0, Ordering::Relaxed);
        self.store.store(0, Ordering::Relaxed);
        self.clear.store(0, Ordering::Relaxed);
    }
}

struct Backing<S> {
    bytes: RwLock<Option<Vec<u8>>>,
    updates: broadcast::Sender<Option<S>>,
    counters: Counters,
}

/// Byte-backed in-memory [`StorageDriver`].
///
/// All handles cloned from one driver share the stored bytes, the update
/// channel and the call counters.
pub struct MemoryDriver<S, C> {
    name: String,
    codec: Arc<C>,
    backing: Arc<Backing<S>>,
}

impl<S, C> MemoryDriver<S, C>
where
    S: Clone + Send + Sync + 'static,
    C: Codec<S>,
{
    /// Create a new, empty driver.
    pub fn new(name: impl Into<String>, codec: C) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            codec: Arc::new(codec),
            backing: Arc::new(Backing {
                bytes: RwLock::new(None),
                updates,
                counters: Counters::default(),
            }),
        }
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.backing
            .bytes
            .read()
            .map(|bytes| bytes.is_none())
            .unwrap_or(true)
    }

    /// Encoded size of the stored copy, or `None` if nothing is stored.
    pub fn stored_len(&self) -> Option<usize> {
        self.backing
            .bytes
            .read()
            .ok()
            .and_then(|bytes| bytes.as_ref().map(Vec::len))
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> DriverStats {
        self.backing.counters.snapshot()
    }

    /// Zero the call counters.
    pub fn reset_stats(&self) {
        self.backing.counters.reset();
    }

    /// Simulate a change made outside this process.
    ///
    /// `Some(data)` replaces the stored bytes, `None` erases them. The change
    /// is then broadcast to every subscriber.
    pub fn push_external(&self, data: Option<&S>) -> DriverResult<()> {
        let encoded = data.map(|d| self.codec.encode(d)).transpose()?;
        *self.write_bytes()? = encoded;
        // No subscribers is not an error: nobody is watching yet.
        let _ = self.backing.updates.send(data.cloned());
        debug!(driver = %self.name, erased = data.is_none(), "external update pushed");
        Ok(())
    }

    fn write_bytes(&self) -> DriverResult<std::sync::RwLockWriteGuard<'_, Option<Vec<u8>>>> {
        self.backing
            .bytes
            .write()
            .map_err(|e| DriverError::Other(format!("lock poisoned: {e}")))
    }
}

impl<S, C> Clone for MemoryDriver<S, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            codec: Arc::clone(&self.codec),
            backing: Arc::clone(&self.backing),
        }
    }
}

#[async_trait]
impl<S, C> StorageDriver<S> for MemoryDriver<S, C>
where
    S: Clone + Send + Sync + 'static,
    C: Codec<S> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> DriverResult<()> {
        self.backing.counters.init.fetch_add(1, Ordering::Relaxed);
        debug!(driver = %self.name, "init");
        Ok(())
    }

    async fn hydrate(&self) -> DriverResult<Option<S>> {
        self.backing.counters.hydrate.fetch_add(1, Ordering::Relaxed);
        debug!(driver = %self.name, "hydrate");
        let bytes = self
            .backing
            .bytes
            .read()
            .map_err(|e| DriverError::Other(format!("lock poisoned: {e}")))?;
        bytes.as_deref().map(|b| self.codec.decode(b)).transpose()
    }

    async fn store(&self, data: &S) -> DriverResult<()> {
        self.backing.counters.store.fetch_add(1, Ordering::Relaxed);
        let encoded = self.codec.encode(data)?;
        debug!(driver = %self.name, codec = self.codec.name(), len = encoded.len(), "store");
        *self.write_bytes()? = Some(encoded);
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        self.backing.counters.clear.fetch_add(1, Ordering::Relaxed);
        debug!(driver = %self.name, "clear");
        *self.write_bytes()? = None;
        Ok(())
    }

    fn clone_data(&self, data: &S) -> S {
        data.clone()
    }

    fn subscribe(&self) -> UpdateStream<S> {
        self.backing.updates.subscribe()
    }
}

impl<S, C> std::fmt::Debug for MemoryDriver<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stored = self
            .backing
            .bytes
            .read()
            .map(|b| b.as_ref().map(Vec::len))
            .unwrap_or(None);
        f.debug_struct("MemoryDriver")
            .field("name", &self.name)
            .field("stored_bytes", &stored)
            .finish()
    }
}
