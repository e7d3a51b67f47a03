//! Timing, classification and logging around each invocation.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chembl_primitives::InvocationId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{Instrument, debug_span, error, info, warn};

use crate::error::InvocationError;
use crate::executor::as_millis;
use crate::handler::{Arguments, OperationFailure, OperationResult};

/// Outcome of one invocation. Exactly one variant is ever present.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The operation produced a value.
    Success(Value),
    /// The operation failed with a classified error.
    Failure(InvocationError),
}

impl Outcome {
    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the classified error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&InvocationError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }
}

/// Ephemeral record of a single supervised invocation.
#[derive(Clone, Debug)]
pub struct InvocationRecord {
    id: InvocationId,
    operation: String,
    arguments: Arguments,
    started_at: DateTime<Utc>,
    started: Instant,
    finished: Instant,
    outcome: Outcome,
}

impl InvocationRecord {
    /// Returns the invocation identifier.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the argument mapping the operation was called with.
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Wall-clock time at which the invocation started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock time at which the invocation finished.
    ///
    /// Derived from the monotonic elapsed time, so it never precedes
    /// [`InvocationRecord::started_at`].
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.elapsed())
            .ok()
            .and_then(|elapsed| self.started_at.checked_add_signed(elapsed))
            .unwrap_or(self.started_at)
    }

    /// Monotonic start instant.
    #[must_use]
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Monotonic end instant.
    #[must_use]
    pub const fn finished(&self) -> Instant {
        self.finished
    }

    /// Time spent between start and end.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished.duration_since(self.started)
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn into_result(self) -> Result<Value, InvocationError> {
        match self.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

/// Receives exactly one record per supervised invocation.
pub trait InvocationSink: Send + Sync {
    /// Records a finished invocation.
    fn record(&self, record: &InvocationRecord);
}

/// Sink that writes one tracing event per invocation.
#[derive(Debug, Default)]
pub struct TracingSink;

impl InvocationSink for TracingSink {
    fn record(&self, record: &InvocationRecord) {
        let elapsed_ms = as_millis(record.elapsed());
        match record.outcome() {
            Outcome::Success(_) => info!(
                operation = record.operation(),
                invocation_id = %record.id(),
                elapsed_ms,
                outcome = "success",
                "operation completed"
            ),
            Outcome::Failure(err @ InvocationError::Timeout { .. }) => warn!(
                operation = record.operation(),
                invocation_id = %record.id(),
                elapsed_ms,
                outcome = "failure",
                error_kind = err.kind().as_str(),
                error = %err,
                "operation timed out"
            ),
            Outcome::Failure(err) => error!(
                operation = record.operation(),
                invocation_id = %record.id(),
                elapsed_ms,
                outcome = "failure",
                error_kind = err.kind().as_str(),
                error = %err,
                "operation failed"
            ),
        }
    }
}

/// Sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<InvocationRecord>>,
}

impl CollectingSink {
    /// Creates an empty shared sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns every collected record.
    pub fn drain(&self) -> Vec<InvocationRecord> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *records)
    }

    /// Returns the number of collected records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InvocationSink for CollectingSink {
    fn record(&self, record: &InvocationRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

/// Wraps invocations with timing, classification and a single log record.
#[derive(Clone)]
pub struct Supervisor {
    sink: Arc<dyn InvocationSink>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor").finish_non_exhaustive()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl Supervisor {
    /// Creates a supervisor reporting to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn InvocationSink>) -> Self {
        Self { sink }
    }

    /// Awaits `inner`, records the invocation once, and returns its value or
    /// the classified error. Failures are never retried.
    ///
    /// # Errors
    ///
    /// Returns the classified error carried by `inner`, or wraps an
    /// unclassified failure into [`InvocationError::UpstreamFailure`].
    pub async fn supervise<F>(
        &self,
        operation: &str,
        arguments: &Arguments,
        inner: F,
    ) -> Result<Value, InvocationError>
    where
        F: Future<Output = OperationResult>,
    {
        let id = InvocationId::random();
        let started_at = Utc::now();
        let started = Instant::now();
        let result = inner
            .instrument(debug_span!("invocation", operation, invocation_id = %id))
            .await;
        let finished = Instant::now();

        let outcome = match result {
            Ok(value) => Outcome::Success(value),
            Err(failure) => Outcome::Failure(classify(operation, failure)),
        };

        let record = InvocationRecord {
            id,
            operation: operation.to_owned(),
            arguments: arguments.clone(),
            started_at,
            started,
            finished,
            outcome,
        };
        self.sink.record(&record);
        record.into_result()
    }
}

/// Keeps classified errors, wraps everything else as an upstream failure.
#[must_use]
pub fn classify(operation: &str, failure: OperationFailure) -> InvocationError {
    match failure.downcast::<InvocationError>() {
        Ok(classified) => *classified,
        Err(other) => InvocationError::upstream(operation, describe_chain(other.as_ref())),
    }
}

fn describe_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
