//! The handler seam every registered operation implements.

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Validated argument mapping handed to a handler.
pub type Arguments = Map<String, Value>;

/// Unclassified failure raised by a handler or collaborator.
///
/// A boxed [`InvocationError`](crate::InvocationError) keeps its
/// classification when it passes through the supervisor; anything else is
/// reported as an upstream failure.
pub type OperationFailure = Box<dyn Error + Send + Sync + 'static>;

/// Result alias for handler invocations.
pub type OperationResult = Result<Value, OperationFailure>;

/// Trait implemented by operation handlers.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Runs the operation with already validated arguments.
    async fn call(&self, args: Arguments) -> OperationResult;
}

#[async_trait]
impl<F, Fut> Operation for F
where
    F: Send + Sync + Fn(Arguments) -> Fut,
    Fut: Future<Output = OperationResult> + Send,
{
    async fn call(&self, args: Arguments) -> OperationResult {
        (self)(args).await
    }
}
