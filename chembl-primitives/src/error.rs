//! Shared error definitions for primitive types.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the tool server.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided invocation identifier could not be parsed.
    #[error("invalid invocation id: {source}")]
    InvalidInvocationId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Operation name failed validation.
    #[error("invalid operation name `{name}`: {reason}")]
    InvalidOperationName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Parameter definition failed validation.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
