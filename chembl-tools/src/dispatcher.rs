//! Front door that resolves, validates, supervises and bounds invocations.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::InvocationError;
use crate::executor::run_with_deadline;
use crate::registry::{Descriptors, OperationRegistry};
use crate::supervisor::{InvocationSink, Supervisor};
use crate::validate::validate_arguments;

/// Routes named invocations through the registry.
///
/// Holds no per-call state; clones share the same registry and sink.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<OperationRegistry>,
    supervisor: Supervisor,
}

impl fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("operations", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl ToolDispatcher {
    /// Creates a dispatcher that logs invocations through `tracing`.
    #[must_use]
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self {
            registry,
            supervisor: Supervisor::default(),
        }
    }

    /// Creates a dispatcher reporting invocation records to `sink`.
    #[must_use]
    pub fn with_sink(registry: Arc<OperationRegistry>, sink: Arc<dyn InvocationSink>) -> Self {
        Self {
            registry,
            supervisor: Supervisor::new(sink),
        }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Lists every registered descriptor, for capability discovery.
    #[must_use]
    pub fn describe(&self) -> Descriptors<'_> {
        self.registry.list()
    }

    /// Invokes `name` with `args`.
    ///
    /// Execution order is fixed: resolve, validate, then
    /// `supervise(run_with_deadline(handler))`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::UnknownOperation`] or
    /// [`InvocationError::InvalidArguments`] before anything runs, and
    /// [`InvocationError::Timeout`] or [`InvocationError::UpstreamFailure`]
    /// when the handler does not succeed in time.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, InvocationError> {
        let resolved = self.registry.resolve(name).inspect_err(|err| {
            warn!(operation = name, error_kind = err.kind().as_str(), "operation rejected");
        })?;

        let arguments = validate_arguments(resolved.descriptor(), args).inspect_err(|err| {
            warn!(
                operation = name,
                error_kind = err.kind().as_str(),
                error = %err,
                "operation rejected"
            );
        })?;

        let operation = resolved.descriptor().name().as_str();
        let inner = run_with_deadline(
            operation,
            resolved.handler().as_ref(),
            arguments.clone(),
            resolved.deadline(),
        );
        self.supervisor.supervise(operation, &arguments, inner).await
    }
}
