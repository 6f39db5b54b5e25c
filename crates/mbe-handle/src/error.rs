//! Handle resolution errors.

use thiserror::Error;

/// Errors from resolving a handle that must exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// The handle was never issued, has been released, or is null.
    #[error("handle {handle} of type {type_name} not found")]
    IdNotFound {
        /// Packed handle bits (see `Handle::to_bits`), `u64::MAX` for null.
        handle: u64,
        /// Type name of the registry the lookup ran against.
        type_name: &'static str,
    },
}

/// Result alias for handle operations.
pub type HandleResult<T> = Result<T, HandleError>;
