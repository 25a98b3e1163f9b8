//! Error types for the core crate.
//!
//! Controller operations surface driver failures as
//! [`DriverError`](hydra_driver::DriverError) unchanged; the only error the
//! core raises itself is a malformed configuration.

use thiserror::Error;

/// Errors from loading [`CoreOptions`](crate::CoreOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into options.
    #[error("invalid options: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
