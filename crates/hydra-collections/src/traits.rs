//! Interfaces shared by the persisted collections.

use async_trait::async_trait;

use crate::error::CollectionResult;

/// One-shot snapshot of a collection's contents at call time.
///
/// Later mutations are not reflected; the iterator owns its items.
pub type Snapshot<T> = std::vec::IntoIter<T>;

/// Lifecycle operations every persisted collection supports.
#[async_trait]
pub trait PersistedSequence: Send + Sync {
    /// Hydrate from the driver now instead of on first use.
    async fn init(&self) -> CollectionResult<()>;

    /// Empty the collection and erase its durable copy.
    async fn clear(&self) -> CollectionResult<()>;

    /// Number of entries in the working copy.
    async fn size(&self) -> CollectionResult<usize>;
}

/// Key/value access, implemented by [`PersistedMap`](crate::PersistedMap)
/// and [`KeyedSet`](crate::KeyedSet).
#[async_trait]
pub trait PersistedMapLike<K, V>: PersistedSequence
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    async fn has(&self, key: &K) -> CollectionResult<bool>;

    async fn get(&self, key: &K) -> CollectionResult<Option<V>>;

    /// Insert or replace, then persist.
    async fn set(&self, key: K, value: V) -> CollectionResult<()>;

    /// Remove one key. Returns `true` if it was present.
    async fn delete(&self, key: &K) -> CollectionResult<bool> {
        self.delete_many(std::slice::from_ref(key)).await
    }

    /// Remove every listed key, then persist once.
    ///
    /// Returns `true` if at least one key was present. Absent keys are
    /// ignored, and the persist happens even when nothing changed.
    async fn delete_many(&self, keys: &[K]) -> CollectionResult<bool>;

    async fn entries(&self) -> CollectionResult<Snapshot<(K, V)>>;

    async fn keys(&self) -> CollectionResult<Snapshot<K>>;

    async fn values(&self) -> CollectionResult<Snapshot<V>>;
}
