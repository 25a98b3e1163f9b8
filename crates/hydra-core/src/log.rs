//! Keyed log events.
//!
//! Every diagnostic the controller and the collections produce is tagged with
//! a [`LogEvent`]. A [`CoreLogMap`] assigns each event a [`LogLevel`], and
//! [`LogLevel::Off`] drops it. Logging never influences control flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tracing target used for all hydra events.
pub const LOG_TARGET: &str = "hydra";

/// Severity for a keyed event. `Off` suppresses the event entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

/// The events a controller or collection can log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogEvent {
    /// Controller constructed.
    Construct,
    /// Hydration attempt started.
    Hydrate,
    /// Working copy handed to the driver.
    Persist,
    /// Reset to template and durable erase.
    Clear,
    /// Replacement listener registered.
    Register,
    /// Replacement listeners being notified.
    Notify,
    /// Driver announced an external change.
    ExternalUpdate,
    /// A key or value was written or removed by a collection.
    Mutation,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Construct => "construct",
            Self::Hydrate => "hydrate",
            Self::Persist => "persist",
            Self::Clear => "clear",
            Self::Register => "register",
            Self::Notify => "notify",
            Self::ExternalUpdate => "external_update",
            Self::Mutation => "mutation",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-event severity configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreLogMap {
    pub construct: LogLevel,
    pub hydrate: LogLevel,
    pub persist: LogLevel,
    pub clear: LogLevel,
    pub register: LogLevel,
    pub notify: LogLevel,
    pub external_update: LogLevel,
    pub mutation: LogLevel,
}

impl Default for CoreLogMap {
    fn default() -> Self {
        Self {
            construct: LogLevel::Debug,
            hydrate: LogLevel::Debug,
            persist: LogLevel::Debug,
            clear: LogLevel::Debug,
            register: LogLevel::Debug,
            notify: LogLevel::Debug,
            external_update: LogLevel::Info,
            mutation: LogLevel::Trace,
        }
    }
}

impl CoreLogMap {
    /// A map that drops every event.
    pub fn silent() -> Self {
        Self {
            construct: LogLevel::Off,
            hydrate: LogLevel::Off,
            persist: LogLevel::Off,
            clear: LogLevel::Off,
            register: LogLevel::Off,
            notify: LogLevel::Off,
            external_update: LogLevel::Off,
            mutation: LogLevel::Off,
        }
    }

    pub fn level(&self, event: LogEvent) -> LogLevel {
        match event {
            LogEvent::Construct => self.construct,
            LogEvent::Hydrate => self.hydrate,
            LogEvent::Persist => self.persist,
            LogEvent::Clear => self.clear,
            LogEvent::Register => self.register,
            LogEvent::Notify => self.notify,
            LogEvent::ExternalUpdate => self.external_update,
            LogEvent::Mutation => self.mutation,
        }
    }

    /// Returns `true` if `event` would be emitted at all.
    pub fn enabled(&self, event: LogEvent) -> bool {
        self.level(event) != LogLevel::Off
    }

    /// Emit `event` at its configured level.
    pub fn emit(&self, event: LogEvent, driver: &str, detail: fmt::Arguments<'_>) {
        let event_name = event.as_str();
        match self.level(event) {
            LogLevel::Trace => {
                tracing::trace!(target: LOG_TARGET, event = event_name, driver, "{detail}")
            }
            LogLevel::Debug => {
                tracing::debug!(target: LOG_TARGET, event = event_name, driver, "{detail}")
            }
            LogLevel::Info => {
                tracing::info!(target: LOG_TARGET, event = event_name, driver, "{detail}")
            }
            LogLevel::Warn => {
                tracing::warn!(target: LOG_TARGET, event = event_name, driver, "{detail}")
            }
            LogLevel::Error => {
                tracing::error!(target: LOG_TARGET, event = event_name, driver, "{detail}")
            }
            LogLevel::Off => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels() {
        let map = CoreLogMap::default();
        assert_eq!(map.level(LogEvent::Construct), LogLevel::Debug);
        assert_eq!(map.level(LogEvent::ExternalUpdate), LogLevel::Info);
        assert_eq!(map.level(LogEvent::Mutation), LogLevel::Trace);
        assert!(map.enabled(LogEvent::Persist));
    }

    #[test]
    fn silent_disables_everything() {
        let map = CoreLogMap::silent();
        for event in [
            LogEvent::Construct,
            LogEvent::Hydrate,
            LogEvent::Persist,
            LogEvent::Clear,
            LogEvent::Register,
            LogEvent::Notify,
            LogEvent::ExternalUpdate,
            LogEvent::Mutation,
        ] {
            assert!(!map.enabled(event), "{event} should be off");
            // Emitting a disabled event is a no-op.
            map.emit(event, "test", format_args!("ignored"));
        }
    }

    #[test]
    fn level_serde_is_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        let level: LogLevel = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(level, LogLevel::Off);
    }

    #[test]
    fn partial_map_uses_defaults() {
        let map: CoreLogMap = serde_json::from_str(r#"{"persist":"info"}"#).unwrap();
        assert_eq!(map.persist, LogLevel::Info);
        assert_eq!(map.clear, LogLevel::Debug);
        assert_eq!(map.mutation, LogLevel::Trace);
    }

    #[test]
    fn event_display() {
        assert_eq!(LogEvent::ExternalUpdate.to_string(), "external_update");
        assert_eq!(format!("{}", LogEvent::Register), "register");
    }
}
