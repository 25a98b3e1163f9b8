//! Persisted key/value map.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use hydra_core::{Controller, CoreOptions, ListenerId};
use hydra_driver::StorageDriver;

use crate::error::CollectionResult;
use crate::traits::{PersistedMapLike, PersistedSequence, Snapshot};

/// A `HashMap` that hydrates from a driver on first use and is persisted
/// after every mutation.
pub struct PersistedMap<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    controller: Controller<HashMap<K, V>>,
}

impl<K, V> PersistedMap<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(driver: Arc<dyn StorageDriver<HashMap<K, V>>>, options: CoreOptions) -> Self {
        Self {
            controller: Controller::new(driver, HashMap::new(), options),
        }
    }

    /// Register a callback fired whenever the working copy is replaced.
    pub fn on_replace<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.controller.on_replace(callback)
    }

    pub fn controller(&self) -> &Controller<HashMap<K, V>> {
        &self.controller
    }
}

#[async_trait]
impl<K, V> PersistedSequence for PersistedMap<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn init(&self) -> CollectionResult<()> {
        Ok(self.controller.init().await?)
    }

    async fn clear(&self) -> CollectionResult<()> {
        Ok(self.controller.reset().await?)
    }

    async fn size(&self) -> CollectionResult<usize> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(session.data().len())
    }
}

#[async_trait]
impl<K, V> PersistedMapLike<K, V> for PersistedMap<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn has(&self, key: &K) -> CollectionResult<bool> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(session.data().contains_key(key))
    }

    async fn get(&self, key: &K) -> CollectionResult<Option<V>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(session.data().get(key).cloned())
    }

    async fn set(&self, key: K, value: V) -> CollectionResult<()> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        session.log_mutation("set", &key);
        session.data_mut().insert(key, value);
        session.persist().await?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[K]) -> CollectionResult<bool> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let mut deleted = false;
        for key in keys {
            if session.data_mut().remove(key).is_some() {
                session.log_mutation("delete", key);
                deleted = true;
            }
        }
        session.persist().await?;
        Ok(deleted)
    }

    async fn entries(&self) -> CollectionResult<Snapshot<(K, V)>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let entries: Vec<(K, V)> = session
            .data()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(entries.into_iter())
    }

    async fn keys(&self) -> CollectionResult<Snapshot<K>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let keys: Vec<K> = session.data().keys().cloned().collect();
        Ok(keys.into_iter())
    }

    async fn values(&self) -> CollectionResult<Snapshot<V>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let values: Vec<V> = session.data().values().cloned().collect();
        Ok(values.into_iter())
    }
}

impl<K, V> Debug for PersistedMap<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedMap")
            .field("controller", &self.controller)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hydra_driver::{JsonCodec, MemoryDriver};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Data {
        test: String,
    }

    type Store = HashMap<String, Data>;

    fn data(s: &str) -> Data {
        Data { test: s.to_string() }
    }

    fn memory() -> MemoryDriver<Store, JsonCodec> {
        MemoryDriver::new("memory", JsonCodec)
    }

    fn make_map(driver: &MemoryDriver<Store, JsonCodec>) -> PersistedMap<String, Data> {
        PersistedMap::new(Arc::new(driver.clone()), CoreOptions::default())
    }

    // -----------------------------------------------------------------------
    // Basic operations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn lifecycle_scenario() {
        let driver = memory();
        let map = make_map(&driver);
        assert_eq!(map.size().await.unwrap(), 0);

        map.set("k1".into(), data("x")).await.unwrap();
        assert_eq!(map.size().await.unwrap(), 1);

        assert!(map.delete(&"k1".to_string()).await.unwrap());
        assert_eq!(map.get(&"k1".to_string()).await.unwrap(), None);
        assert_eq!(map.size().await.unwrap(), 0);

        map.set("k1".into(), data("x")).await.unwrap();
        map.clear().await.unwrap();
        assert_eq!(map.size().await.unwrap(), 0);
        assert!(driver.is_empty());
    }

    #[tokio::test]
    async fn get_returns_last_set_value() {
        let map = make_map(&memory());
        map.set("k".into(), data("first")).await.unwrap();
        map.set("k".into(), data("second")).await.unwrap();
        assert_eq!(map.get(&"k".to_string()).await.unwrap(), Some(data("second")));
        assert!(map.has(&"k".to_string()).await.unwrap());
        assert!(!map.has(&"other".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_instance_hydrates_from_store() {
        let driver = memory();
        let a = make_map(&driver);
        a.init().await.unwrap();
        a.set("key1".into(), data("test")).await.unwrap();

        let b = make_map(&driver);
        assert_eq!(b.get(&"key1".to_string()).await.unwrap(), Some(data("test")));
        assert_eq!(b.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn snapshots_are_not_live() {
        let map = make_map(&memory());
        map.set("key1".into(), data("test")).await.unwrap();

        let entries = map.entries().await.unwrap();
        let keys = map.keys().await.unwrap();
        let values = map.values().await.unwrap();
        map.set("key2".into(), data("later")).await.unwrap();

        assert_eq!(entries.collect::<Vec<_>>(), vec![("key1".to_string(), data("test"))]);
        assert_eq!(keys.collect::<Vec<_>>(), vec!["key1".to_string()]);
        assert_eq!(values.collect::<Vec<_>>(), vec![data("test")]);
        assert_eq!(map.keys().await.unwrap().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Batch delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_delete_reports_any_found() {
        let driver = memory();
        let map = make_map(&driver);
        map.set("key1".into(), data("test")).await.unwrap();
        driver.reset_stats();

        let removed = map
            .delete_many(&["key1".to_string(), "key2".to_string()])
            .await
            .unwrap();
        assert!(removed);
        assert_eq!(driver.stats().store, 1);
        assert_eq!(map.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn batch_delete_of_absent_keys_still_persists() {
        let driver = memory();
        let map = make_map(&driver);
        map.init().await.unwrap();

        let removed = map
            .delete_many(&["nope".to_string(), "nada".to_string()])
            .await
            .unwrap();
        assert!(!removed);
        assert_eq!(driver.stats().store, 1);
    }

    // -----------------------------------------------------------------------
    // Hydration behavior
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reads_hydrate_once() {
        let driver = memory();
        let map = make_map(&driver);
        map.size().await.unwrap();
        map.has(&"a".to_string()).await.unwrap();
        map.get(&"a".to_string()).await.unwrap();
        map.values().await.unwrap();
        assert_eq!(driver.stats().hydrate, 1);
    }

    #[tokio::test]
    async fn write_before_read_keeps_durable_data() {
        let driver = memory();
        make_map(&driver).set("old".into(), data("kept")).await.unwrap();

        let map = make_map(&driver);
        map.set("new".into(), data("added")).await.unwrap();
        assert_eq!(map.size().await.unwrap(), 2);

        let reopened = make_map(&driver);
        assert_eq!(reopened.get(&"old".to_string()).await.unwrap(), Some(data("kept")));
    }

    #[tokio::test]
    async fn clear_fires_listener_and_rehydrates() {
        let driver = memory();
        let map = make_map(&driver);
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        map.on_replace(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        map.init().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        map.clear().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!map.controller().is_hydrated().await);

        map.size().await.unwrap();
        assert_eq!(driver.stats().hydrate, 2);
    }

    #[tokio::test]
    async fn hidden_keys_do_not_change_results() {
        let driver = memory();
        let map: PersistedMap<String, Data> = PersistedMap::new(
            Arc::new(driver.clone()),
            CoreOptions::default().with_hide_key(true),
        );
        map.set("secret".into(), data("v")).await.unwrap();
        assert_eq!(map.get(&"secret".to_string()).await.unwrap(), Some(data("v")));
    }

    #[test]
    fn debug_format() {
        let map = make_map(&memory());
        let debug = format!("{map:?}");
        assert!(debug.contains("PersistedMap"));
    }
}
