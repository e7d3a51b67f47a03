//! Classified errors produced by registration and invocation.

use std::fmt;
use std::time::Duration;

use chembl_primitives::ParamType;
use serde::Serialize;
use thiserror::Error;

/// Result alias for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Tag carried by every classified invocation failure on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum ErrorKind {
    /// The deadline elapsed before the operation completed.
    Timeout,
    /// No operation with the requested name exists.
    UnknownOperation,
    /// The arguments did not match the parameter schema.
    InvalidArguments,
    /// The collaborator raised an error.
    UpstreamFailure,
}

impl ErrorKind {
    /// Returns the tag as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::UnknownOperation => "UnknownOperation",
            Self::InvalidArguments => "InvalidArguments",
            Self::UpstreamFailure => "UpstreamFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single way an argument payload deviates from the parameter list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum ArgumentProblem {
    /// The payload was not a JSON object.
    NotAnObject {
        /// JSON type that was supplied instead.
        found: &'static str,
    },
    /// A required parameter was absent.
    Missing {
        /// Parameter name.
        field: String,
    },
    /// A field that the operation does not declare.
    Unexpected {
        /// Field name.
        field: String,
    },
    /// A field whose JSON type does not match its parameter type.
    Mistyped {
        /// Parameter name.
        field: String,
        /// Declared type.
        expected: ParamType,
        /// JSON type that was supplied.
        found: &'static str,
    },
}

impl fmt::Display for ArgumentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => write!(f, "arguments must be an object, got {found}"),
            Self::Missing { field } => write!(f, "missing required field `{field}`"),
            Self::Unexpected { field } => write!(f, "unexpected field `{field}`"),
            Self::Mistyped {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` must be {expected}, got {found}"),
        }
    }
}

/// Classified failure of a single invocation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvocationError {
    /// Requested operation does not exist.
    #[error("operation `{name}` is not registered")]
    UnknownOperation {
        /// Name that failed to resolve.
        name: String,
    },

    /// Arguments failed schema validation.
    #[error("invalid arguments for `{operation}`: {}", join_problems(.problems))]
    InvalidArguments {
        /// Operation being invoked.
        operation: String,
        /// Every problem found, in parameter order followed by extra fields.
        problems: Vec<ArgumentProblem>,
    },

    /// Deadline elapsed before the operation completed.
    #[error("operation `{operation}` timed out after {}ms", millis(.deadline))]
    Timeout {
        /// Operation being invoked.
        operation: String,
        /// Configured deadline.
        deadline: Duration,
    },

    /// The collaborator failed.
    #[error("operation `{operation}` failed: {reason}")]
    UpstreamFailure {
        /// Operation being invoked.
        operation: String,
        /// Original failure message.
        reason: String,
    },
}

impl InvocationError {
    /// Returns the wire tag for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
        }
    }

    /// Returns the operation name the error refers to.
    #[must_use]
    pub fn operation(&self) -> &str {
        match self {
            Self::UnknownOperation { name } => name,
            Self::InvalidArguments { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::UpstreamFailure { operation, .. } => operation,
        }
    }

    /// Convenience constructor for upstream failures.
    #[must_use]
    pub fn upstream(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

fn millis(deadline: &Duration) -> u128 {
    deadline.as_millis()
}

fn join_problems(problems: &[ArgumentProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced while building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Name collided with an existing registration.
    #[error("operation `{name}` is already registered")]
    DuplicateOperation {
        /// Name of the offending operation.
        name: String,
    },

    /// Descriptor failed validation.
    #[error("invalid operation descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Deadline or other registration setting is unusable.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl RegistryError {
    /// Convenience constructor for configuration errors.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
