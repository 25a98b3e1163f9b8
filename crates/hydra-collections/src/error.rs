use hydra_driver::DriverError;
use thiserror::Error;

/// Errors from collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The storage driver failed. Passed through untouched.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A key projection returned something other than a string, number or
    /// boolean. This is a configuration bug in the caller.
    #[error("key projection must return a string, number or boolean, got {found}")]
    NonPrimitiveKey { found: &'static str },
}

impl CollectionError {
    /// Returns `true` for caller configuration errors, as opposed to driver
    /// failures.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::NonPrimitiveKey { .. })
    }
}

/// Convenience alias for collection results.
pub type CollectionResult<T> = Result<T, CollectionError>;
