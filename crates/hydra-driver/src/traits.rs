use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::DriverResult;

/// Receiver for externally-originated updates.
///
/// `Some(data)` means the durable state was replaced by someone else;
/// `None` means it was erased.
pub type UpdateStream<S> = broadcast::Receiver<Option<S>>;

/// Durable storage backend for a whole collection of shape `S`.
///
/// Implementations must satisfy these invariants:
/// - `init` is idempotent and safe to call repeatedly.
/// - `store` persists a full replacement of the durable state.
/// - `hydrate` returns `Ok(None)` if nothing is stored.
/// - Updates made through `store`/`clear` on this handle are not echoed on
///   the update stream; only changes from elsewhere are.
#[async_trait]
pub trait StorageDriver<S>: Send + Sync
where
    S: Send + Sync + 'static,
{
    /// Human-readable driver name, used in log output.
    fn name(&self) -> &str;

    /// Prepare the backend (open handles, create directories, ...).
    async fn init(&self) -> DriverResult<()>;

    /// Load the durable copy, if any.
    async fn hydrate(&self) -> DriverResult<Option<S>>;

    /// Replace the durable copy with `data`.
    async fn store(&self, data: &S) -> DriverResult<()>;

    /// Erase the durable copy.
    async fn clear(&self) -> DriverResult<()>;

    /// Structural copy of `data` that shares nothing with the original.
    fn clone_data(&self, data: &S) -> S;

    /// Subscribe to external updates.
    fn subscribe(&self) -> UpdateStream<S>;
}
