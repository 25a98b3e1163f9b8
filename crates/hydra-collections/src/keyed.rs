//! Persisted set with map-like lookup by a derived key.
//!
//! A [`KeyedSet`] stores whole values in a `HashSet` and finds them by one of
//! their fields. Keys are compared through a [`KeyProjection`], which turns
//! the field into a [`Primitive`]. Keys that are different instances but
//! project to the same primitive (two timestamps with the same millisecond
//! value, say) address the same entry.
//!
//! Lookups scan the working copy linearly.

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use hydra_core::{Controller, CoreOptions, ListenerId};
use hydra_driver::StorageDriver;
use serde_json::Value;

use crate::error::{CollectionError, CollectionResult};
use crate::traits::{PersistedMapLike, PersistedSequence, Snapshot};

/// Comparable scalar produced by a key projection.
///
/// Equality is strict: numbers compare as `f64`, so `NaN` never matches,
/// not even itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    String(String),
    Number(f64),
    Bool(bool),
}

impl TryFrom<Value> for Primitive {
    type Error = CollectionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or(CollectionError::NonPrimitiveKey { found: "number" }),
            Value::Null => Err(CollectionError::NonPrimitiveKey { found: "null" }),
            Value::Array(_) => Err(CollectionError::NonPrimitiveKey { found: "array" }),
            Value::Object(_) => Err(CollectionError::NonPrimitiveKey { found: "object" }),
        }
    }
}

/// Output of a key projection.
///
/// Native scalars and [`Primitive`] always convert. A [`Value`] is checked at
/// run time, and anything but a string, number or boolean is rejected with
/// [`CollectionError::NonPrimitiveKey`]. JSON has no `NaN` or infinities, so
/// a projection that can produce them should return `f64`.
pub trait IntoPrimitive {
    fn into_primitive(self) -> CollectionResult<Primitive>;
}

impl IntoPrimitive for Primitive {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(self)
    }
}

impl IntoPrimitive for Value {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Primitive::try_from(self)
    }
}

impl IntoPrimitive for String {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(Primitive::String(self))
    }
}

impl IntoPrimitive for &str {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(Primitive::String(self.to_string()))
    }
}

impl IntoPrimitive for bool {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(Primitive::Bool(self))
    }
}

impl IntoPrimitive for f64 {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(Primitive::Number(self))
    }
}

impl IntoPrimitive for i64 {
    fn into_primitive(self) -> CollectionResult<Primitive> {
        Ok(Primitive::Number(self as f64))
    }
}

type FieldFn<K, V> = dyn Fn(&V) -> &K + Send + Sync;
type ProjectFn<K> = dyn Fn(&K) -> CollectionResult<Primitive> + Send + Sync;

/// How a [`KeyedSet`] derives and compares keys.
pub struct KeyProjection<K, V> {
    field: Arc<FieldFn<K, V>>,
    project: Arc<ProjectFn<K>>,
}

impl<K, V> KeyProjection<K, V> {
    /// `field` selects the key inside a value; `project` maps a key to the
    /// scalar used for comparison. See [`IntoPrimitive`] for what `project`
    /// may return.
    pub fn new<F, P, R>(field: F, project: P) -> Self
    where
        F: Fn(&V) -> &K + Send + Sync + 'static,
        P: Fn(&K) -> R + Send + Sync + 'static,
        R: IntoPrimitive + 'static,
        K: 'static,
        V: 'static,
    {
        Self {
            field: Arc::new(field),
            project: Arc::new(move |key: &K| project(key).into_primitive()),
        }
    }

    pub fn key_of<'v>(&self, value: &'v V) -> &'v K {
        (self.field)(value)
    }

    pub fn project(&self, key: &K) -> CollectionResult<Primitive> {
        (self.project)(key)
    }

    fn project_value(&self, value: &V) -> CollectionResult<Primitive> {
        self.project(self.key_of(value))
    }

    /// First stored value whose key projects to `target`.
    fn find<'d>(
        &self,
        data: &'d HashSet<V>,
        target: &Primitive,
    ) -> CollectionResult<Option<&'d V>> {
        for value in data {
            if self.project_value(value)? == *target {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl<K, V> Clone for KeyProjection<K, V> {
    fn clone(&self) -> Self {
        Self {
            field: Arc::clone(&self.field),
            project: Arc::clone(&self.project),
        }
    }
}

/// A `HashSet` of values addressed by a key derived from each value.
pub struct KeyedSet<K, V>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Eq + Hash + Clone + Send + Sync + 'static,
{
    controller: Controller<HashSet<V>>,
    projection: KeyProjection<K, V>,
}

impl<K, V> KeyedSet<K, V>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(
        projection: KeyProjection<K, V>,
        driver: Arc<dyn StorageDriver<HashSet<V>>>,
        options: CoreOptions,
    ) -> Self {
        Self {
            controller: Controller::new(driver, HashSet::new(), options),
            projection,
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

    pub fn projection(&self) -> &KeyProjection<K, V> {
        &self.projection
    }
}

#[async_trait]
impl<K, V> PersistedSequence for KeyedSet<K, V>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Eq + Hash + Clone + Send + Sync + 'static,
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
impl<K, V> PersistedMapLike<K, V> for KeyedSet<K, V>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Eq + Hash + Clone + Send + Sync + 'static,
{
    async fn has(&self, key: &K) -> CollectionResult<bool> {
        let target = self.projection.project(key)?;
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(self.projection.find(session.data(), &target)?.is_some())
    }

    async fn get(&self, key: &K) -> CollectionResult<Option<V>> {
        let target = self.projection.project(key)?;
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        Ok(self.projection.find(session.data(), &target)?.cloned())
    }

    /// Replace the entry whose key projects like `key` with `value`.
    ///
    /// Both `key` and the key field of `value` are validated before anything
    /// is mutated.
    async fn set(&self, key: K, value: V) -> CollectionResult<()> {
        let target = self.projection.project(&key)?;
        self.projection.project_value(&value)?;
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let existing = self.projection.find(session.data(), &target)?.cloned();
        if let Some(old) = existing {
            session.data_mut().remove(&old);
        }
        session.log_mutation("set", &key);
        session.data_mut().insert(value);
        session.persist().await?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[K]) -> CollectionResult<bool> {
        let targets = keys
            .iter()
            .map(|key| self.projection.project(key))
            .collect::<CollectionResult<Vec<_>>>()?;
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;

        // One removal per listed key, so a repeated key also removes a
        // second value that shares its projection.
        let mut deleted = false;
        for (key, target) in keys.iter().zip(&targets) {
            let found = self.projection.find(session.data(), target)?.cloned();
            if let Some(value) = found {
                session.data_mut().remove(&value);
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
            .map(|v| (self.projection.key_of(v).clone(), v.clone()))
            .collect();
        Ok(entries.into_iter())
    }

    async fn keys(&self) -> CollectionResult<Snapshot<K>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let keys: Vec<K> = session
            .data()
            .iter()
            .map(|v| self.projection.key_of(v).clone())
            .collect();
        Ok(keys.into_iter())
    }

    async fn values(&self) -> CollectionResult<Snapshot<V>> {
        let mut session = self.controller.lock().await;
        session.ensure_hydrated().await?;
        let values: Vec<V> = session.data().iter().cloned().collect();
        Ok(values.into_iter())
    }
}

impl<K, V> Debug for KeyedSet<K, V>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedSet")
            .field("controller", &self.controller)
            .finish()
    }
}
