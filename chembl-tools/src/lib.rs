//! Tool-invocation layer.
//!
//! Operations are registered once on a [`registry::RegistryBuilder`], frozen
//! into an immutable [`registry::OperationRegistry`], and invoked through the
//! [`dispatcher::ToolDispatcher`]. Every invocation is validated, supervised
//! and bounded by a deadline:
//!
//! ```text
//! dispatcher -> supervisor -> bounded executor -> adapter -> collaborator
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod adapter;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handler;
pub mod registry;
pub mod supervisor;
mod validate;

pub use adapter::{BoundArguments, ForwardFuture, ForwardingAdapter, ShapeMismatch};
pub use descriptor::{DescriptorBuilder, OperationCategory, OperationDescriptor};
pub use dispatcher::ToolDispatcher;
pub use error::{ArgumentProblem, ErrorKind, InvocationError, RegistryError, RegistryResult};
pub use executor::{DeadlinePolicy, run_with_deadline};
pub use handler::{Arguments, Operation, OperationFailure, OperationResult};
pub use registry::{Descriptors, OperationRegistry, RegistryBuilder, ResolvedOperation};
pub use supervisor::{
    CollectingSink, InvocationRecord, InvocationSink, Outcome, Supervisor, TracingSink,
};
