//! Observability setup for the ChEMBL tool server.
//!
//! Logs always go to stderr so stdout stays free for protocol frames.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {reason}")]
    Filter {
        /// Offending directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {reason}")]
    Install {
        /// Additional context.
        reason: String,
    },
}

/// Builds the filter: `RUST_LOG` when set and valid, otherwise `default_directive`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] if `default_directive` is invalid and
/// `RUST_LOG` does not supply a usable filter.
pub fn filter(default_directive: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_env(FILTER_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|err| TelemetryError::Filter {
        directive: default_directive.to_owned(),
        reason: err.to_string(),
    })
}

/// Installs the global fmt subscriber writing to stderr.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(default_directive: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| TelemetryError::Install {
            reason: err.to_string(),
        })?;
    tracing::debug!(directive = default_directive, "telemetry initialised");
    Ok(())
}
