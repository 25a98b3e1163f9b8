//! Persisted set of distinct values.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use hydra_core::{Controller, CoreOptions, ListenerId};
use hydra_driver::StorageDriver;

use crate::error::CollectionResult;
use crate::traits::{PersistedSequence, Snapshot};

/// A `HashSet` that hydrates from a driver on first use and is persisted
/// after every mutation. Identity is value equality.
pub struct PersistedSet<V>
where
    V: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    controller: Controller<HashSet<V>>,
}

impl<V> PersistedSet<V>
where
    V: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new(driver: Arc<dyn StorageDriver<HashSet<V>>>, options: CoreOptions) -> Self {
        Self {
            controller: Controller::new(driver, HashSet::new(), options),
        }
    }

    /// Register a callback fired whenever the working copy is replaced.
    pub fn on_replace<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.controller.on_replace(callback)
    }

    pub fn controller(&self) -> &Controller<HashSet<V>> {
        &self.controller
    }

    /// Insert `value` if not already present, then persist.
    pub async fn add(&self, value: V) -> CollectionResult<()> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        session.log_mutation("add", &value);
        session.data_mut().insert(value);
        session.persist().await?;
        Ok(())
    }

    pub async fn has(&self, value: &V) -> CollectionResult<bool> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(session.data().contains(value))
    }

    /// Remove one value. Returns `true` if it was present.
    pub async fn delete(&self, value: &V) -> CollectionResult<bool> {
        self.delete_many(std::slice::from_ref(value)).await
    }

    /// Remove every listed value, then persist once. Returns `true` if at
    /// least one was present.
    pub async fn delete_many(&self, values: &[V]) -> CollectionResult<bool> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let mut deleted = false;
        for value in values {
            if session.data_mut().remove(value) {
                session.log_mutation("delete", value);
                deleted = true;
            }
        }
        session.persist().await?;
        Ok(deleted)
    }

    pub async fn values(&self) -> CollectionResult<Snapshot<V>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let values: Vec<V> = session.data().iter().cloned().collect();
        Ok(values.into_iter())
    }

    /// Same items as [`values`](Self::values), as a native set's `keys` yields.
    pub async fn keys(&self) -> CollectionResult<Snapshot<V>> {
        self.values().await
    }

    /// `(value, value)` pairs, matching what a native set yields.
    pub async fn entries(&self) -> CollectionResult<Snapshot<(V, V)>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let entries: Vec<(V, V)> = session
            .data()
            .iter()
            .map(|v| (v.clone(), v.clone()))
            .collect();
        Ok(entries.into_iter())
    }
}

#[async_trait]
impl<V> PersistedSequence for PersistedSet<V>
where
    V: Eq + Hash + Clone + Debug + Send + Sync + 'static,
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

impl<V> Debug for PersistedSet<V>
where
    V: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSet")
            .field("controller", &self.controller)
            .finish()
    }
}
