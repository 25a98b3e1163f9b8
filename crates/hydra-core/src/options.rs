use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::log::CoreLogMap;

/// Options shared by a controller and the collection built on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreOptions {
    /// Replace keys with `<hidden>` in log output. Has no behavioral effect.
    pub hide_key: bool,
    /// Severity of each keyed log event.
    pub log: CoreLogMap,
}

impl CoreOptions {
    /// Options with every log event turned off.
    pub fn silent() -> Self {
        Self {
            log: CoreLogMap::silent(),
            ..Default::default()
        }
    }

    /// Builder-style setter for [`hide_key`](Self::hide_key).
    pub fn with_hide_key(mut self, hide_key: bool) -> Self {
        self.hide_key = hide_key;
        self
    }

    /// Parse options from a TOML document. Missing fields take defaults.
    ///
    /// ```toml
    /// hide_key = true
    ///
    /// [log]
    /// persist = "info"
    /// mutation = "off"
    /// ```
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }
}
