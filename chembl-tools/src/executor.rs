//! Deadline-bounded execution of a single operation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::time::timeout;

use crate::descriptor::OperationCategory;
use crate::error::{InvocationError, RegistryError, RegistryResult};
use crate::handler::{Arguments, Operation, OperationFailure, OperationResult};

/// Default deadline for bulk data-service queries.
pub const DEFAULT_DATA_QUERY_DEADLINE: Duration = Duration::from_secs(10);
/// Default deadline for single-value utility calls.
pub const DEFAULT_UTILITY_DEADLINE: Duration = Duration::from_secs(5);

/// Per-category default deadlines applied at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadlinePolicy {
    data_query: Duration,
    utility: Duration,
}

impl DeadlinePolicy {
    /// Creates a policy from explicit per-category deadlines.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Configuration`] if either deadline is zero.
    pub fn new(data_query: Duration, utility: Duration) -> RegistryResult<Self> {
        Ok(Self {
            data_query: validate_deadline("data-query default", data_query)?,
            utility: validate_deadline("utility default", utility)?,
        })
    }

    /// Builds a policy from fractional seconds, as found in configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Configuration`] if either value is zero,
    /// negative, or not finite.
    pub fn from_secs_f64(data_query: f64, utility: f64) -> RegistryResult<Self> {
        Self::new(
            duration_from_secs("data-query default", data_query)?,
            duration_from_secs("utility default", utility)?,
        )
    }

    /// Returns the default deadline for the given category.
    #[must_use]
    pub const fn for_category(&self, category: OperationCategory) -> Duration {
        match category {
            OperationCategory::DataQuery => self.data_query,
            OperationCategory::Utility => self.utility,
        }
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            data_query: DEFAULT_DATA_QUERY_DEADLINE,
            utility: DEFAULT_UTILITY_DEADLINE,
        }
    }
}

/// Rejects deadlines that would disable the bound.
pub(crate) fn validate_deadline(subject: &str, deadline: Duration) -> RegistryResult<Duration> {
    if deadline.is_zero() {
        return Err(RegistryError::configuration(format!(
            "deadline for {subject} must be greater than zero"
        )));
    }
    Ok(deadline)
}

/// Converts configured seconds into a deadline.
///
/// # Errors
///
/// Returns [`RegistryError::Configuration`] for zero, negative, or
/// non-finite input.
pub fn duration_from_secs(subject: &str, secs: f64) -> RegistryResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(RegistryError::configuration(format!(
            "deadline for {subject} must be a positive number of seconds, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|err| RegistryError::configuration(format!("deadline for {subject}: {err}")))
        .and_then(|deadline| validate_deadline(subject, deadline))
}

/// A handler panicked instead of returning.
#[derive(Debug, Error)]
#[error("operation panicked: {message}")]
pub struct HandlerPanic {
    message: String,
}

/// Runs `handler` with `args`, abandoning it once `deadline` elapses.
///
/// On timeout the handler future is dropped; any network work it started may
/// still finish in the background, but its result is discarded. The timeout
/// is returned as a boxed [`InvocationError::Timeout`] so the supervisor
/// keeps its classification.
///
/// # Errors
///
/// Returns the handler's own failure, a [`HandlerPanic`] if it panicked, or
/// the boxed timeout.
pub async fn run_with_deadline(
    operation: &str,
    handler: &dyn Operation,
    args: Arguments,
    deadline: Duration,
) -> OperationResult {
    let guarded = AssertUnwindSafe(handler.call(args)).catch_unwind();
    match timeout(deadline, guarded).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(Box::new(HandlerPanic {
            message: panic_message(payload.as_ref()),
        })),
        Err(_) => {
            let timeout: OperationFailure = Box::new(InvocationError::Timeout {
                operation: operation.to_owned(),
                deadline,
            });
            Err(timeout)
        }
    }
}

/// Saturating conversion used for log fields.
pub(crate) fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
