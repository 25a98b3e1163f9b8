//! The hydration [`Controller`].
//!
//! All state lives behind one `tokio::sync::Mutex`. A caller takes the lock
//! with [`Controller::lock`] and gets a [`Session`]: within a session,
//! ensure-hydrated, read, mutate and persist run as one uninterrupted
//! sequence. External updates from the driver take the same lock, so they
//! can never land between a mutation and its persist.

use std::fmt;
use std::sync::{Arc, Weak};

use hydra_driver::{DriverResult, StorageDriver, UpdateStream};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{oneshot, Mutex, MutexGuard};

use crate::listeners::{ListenerId, ListenerRegistry};
use crate::log::LogEvent;
use crate::options::CoreOptions;

/// Placeholder printed instead of keys when `hide_key` is set.
const HIDDEN_KEY: &str = "<hidden>";

struct State<S> {
    /// The working copy. Replaced wholesale, never swapped piecemeal.
    data: S,
    /// Set after the first hydrate attempt, cleared by reset.
    initialized: bool,
}

struct Inner<S>
where
    S: Send + Sync + 'static,
{
    driver: Arc<dyn StorageDriver<S>>,
    template: S,
    state: Mutex<State<S>>,
    listeners: ListenerRegistry,
    options: CoreOptions,
    // Dropping the sender stops the update watcher.
    _shutdown: oneshot::Sender<()>,
}

impl<S> Inner<S>
where
    S: Send + Sync + 'static,
{
    fn log(&self, event: LogEvent, detail: fmt::Arguments<'_>) {
        self.options.log.emit(event, self.driver.name(), detail);
    }

    fn notify(&self) {
        if self.options.log.enabled(LogEvent::Notify) {
            self.log(
                LogEvent::Notify,
                format_args!("notifying {} listeners", self.listeners.len()),
            );
        }
        self.listeners.fire();
    }

    async fn apply_external(&self, update: Option<S>) {
        let mut state = self.state.lock().await;
        self.log(
            LogEvent::ExternalUpdate,
            format_args!("external update, erased: {}", update.is_none()),
        );
        state.data = match update {
            Some(data) => data,
            None => self.driver.clone_data(&self.template),
        };
        self.notify();
    }
}

/// Owner of one collection's working copy.
///
/// Cloning a `Controller` yields another handle to the same state.
pub struct Controller<S>
where
    S: Send + Sync + 'static,
{
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Controller<S>
where
    S: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Controller<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a controller seeded with a clone of `initial`.
    ///
    /// The driver is not contacted until the first operation. When called
    /// inside a tokio runtime, a background task applies the driver's
    /// external updates for as long as the controller lives; outside a
    /// runtime, external updates must be fed through
    /// [`apply_external`](Self::apply_external).
    pub fn new(driver: Arc<dyn StorageDriver<S>>, initial: S, options: CoreOptions) -> Self {
        let data = driver.clone_data(&initial);
        let stream = driver.subscribe();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let inner = Arc::new(Inner {
            driver,
            template: initial,
            state: Mutex::new(State {
                data,
                initialized: false,
            }),
            listeners: ListenerRegistry::default(),
            options,
            _shutdown: shutdown_tx,
        });
        inner.log(LogEvent::Construct, format_args!("controller constructed"));

        if let Ok(handle) = Handle::try_current() {
            handle.spawn(watch_updates(Arc::downgrade(&inner), stream, shutdown_rx));
        }

        Self { inner }
    }

    /// Enter the critical section.
    pub async fn lock(&self) -> Session<'_, S> {
        Session {
            inner: &self.inner,
            state: self.inner.state.lock().await,
        }
    }

    /// Hydrate from the driver if not already done.
    pub async fn init(&self) -> DriverResult<()> {
        self.lock().await.ensure_hydrated().await
    }

    /// Reset the working copy to the template, erase durable state and mark
    /// the controller unhydrated. Listeners always fire on success.
    pub async fn reset(&self) -> DriverResult<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.log(LogEvent::Clear, format_args!("clearing"));
        state.data = self.inner.driver.clone_data(&self.inner.template);
        self.inner.driver.clear().await?;
        state.initialized = false;
        self.inner.notify();
        Ok(())
    }

    /// Register a callback fired on every later working-copy replacement.
    pub fn on_replace<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.listeners.register(Arc::new(callback));
        self.inner
            .log(LogEvent::Register, format_args!("listener {id:?} registered"));
        id
    }

    /// Unregister a listener. Returns `true` if it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Replace the working copy with an externally-originated update.
    ///
    /// `None` means the durable copy was erased; the working copy becomes a
    /// template clone. The hydration flag is left as is.
    pub async fn apply_external(&self, update: Option<S>) {
        self.inner.apply_external(update).await;
    }

    /// Whether the working copy has been hydrated in the current epoch.
    pub async fn is_hydrated(&self) -> bool {
        self.inner.state.lock().await.initialized
    }

    pub fn options(&self) -> &CoreOptions {
        &self.inner.options
    }

    pub fn driver_name(&self) -> &str {
        self.inner.driver.name()
    }
}

impl<S> fmt::Debug for Controller<S>
where
    S: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("driver", &self.inner.driver.name())
            .field("listeners", &self.inner.listeners.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Exclusive access to a controller's working copy.
///
/// The lock is released when the session is dropped.
pub struct Session<'a, S>
where
    S: Send + Sync + 'static,
{
    inner: &'a Inner<S>,
    state: MutexGuard<'a, State<S>>,
}

impl<S> Session<'_, S>
where
    S: Send + Sync + 'static,
{
    /// Hydrate the working copy once per epoch.
    ///
    /// On the first call, runs driver `init` then `hydrate`. Existing data
    /// replaces the working copy and fires listeners; no data leaves the
    /// seed in place silently. Later calls return immediately. A driver
    /// error propagates and leaves the session unhydrated, so the next call
    /// tries again.
    pub async fn ensure_hydrated(&mut self) -> DriverResult<()> {
        if self.state.initialized {
            return Ok(());
        }
        self.inner.log(LogEvent::Hydrate, format_args!("hydrating"));
        self.inner.driver.init().await?;
        let found = self.inner.driver.hydrate().await?;
        let replaced = found.is_some();
        if let Some(data) = found {
            self.state.data = data;
        }
        self.state.initialized = true;
        if replaced {
            self.inner.notify();
        }
        Ok(())
    }

    /// Write the working copy through the driver.
    ///
    /// A failure leaves the in-memory copy as mutated.
    pub async fn persist(&self) -> DriverResult<()> {
        self.inner.log(LogEvent::Persist, format_args!("persisting"));
        self.inner.driver.store(&self.state.data).await
    }

    pub fn data(&self) -> &S {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut S {
        &mut self.state.data
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.initialized
    }

    /// Log a keyed mutation, honoring `hide_key`.
    pub fn log_mutation(&self, action: &str, key: &dyn fmt::Debug) {
        let log = &self.inner.options.log;
        if !log.enabled(LogEvent::Mutation) {
            return;
        }
        if self.inner.options.hide_key {
            self.inner
                .log(LogEvent::Mutation, format_args!("{action} {HIDDEN_KEY}"));
        } else {
            self.inner
                .log(LogEvent::Mutation, format_args!("{action} {key:?}"));
        }
    }
}

async fn watch_updates<S>(
    inner: Weak<Inner<S>>,
    mut stream: UpdateStream<S>,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: Clone + Send + Sync + 'static,
{
    loop {
        let received = tokio::select! {
            _ = &mut shutdown => break,
            received = stream.recv() => received,
        };
        match received {
            Ok(update) => {
                let Some(inner) = inner.upgrade() else { break };
                inner.apply_external(update).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "external update stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
