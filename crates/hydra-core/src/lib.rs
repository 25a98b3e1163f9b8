//! Hydration controller for hydra persisted collections.
//!
//! A [`Controller`] owns the in-memory working copy of one collection and
//! mediates every load and save against a
//! [`StorageDriver`](hydra_driver::StorageDriver):
//!
//! - the first operation hydrates the working copy from the driver, once;
//! - mutations are written back with [`Session::persist`];
//! - [`Controller::reset`] erases durable state and reseeds the working copy
//!   from a template clone;
//! - updates announced by the driver replace the working copy wholesale.
//!
//! Listeners registered with [`Controller::on_replace`] fire on every
//! wholesale replacement: a hydrate that found data, a reset, or an external
//! update. A hydrate that finds nothing is silent.
//!
//! # Modules
//!
//! - [`controller`] — [`Controller`] and its [`Session`] critical section
//! - [`listeners`] — replacement listener registry
//! - [`options`] — [`CoreOptions`] configuration
//! - [`log`] — keyed log events and their severity map
//! - [`error`] — configuration errors

pub mod controller;
pub mod error;
pub mod listeners;
pub mod log;
pub mod options;

pub use controller::{Controller, Session};
pub use error::{ConfigError, ConfigResult};
pub use listeners::ListenerId;
pub use log::{CoreLogMap, LogEvent, LogLevel};
pub use options::CoreOptions;
