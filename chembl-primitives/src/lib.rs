//! Core shared types for the ChEMBL tool server.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod name;
mod schema;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier attached to every supervised invocation.
pub use ids::InvocationId;
/// Validated operation identifiers.
pub use name::OperationName;
/// Parameter and result schema building blocks.
pub use schema::{ParamSpec, ParamType, ResultShape};
