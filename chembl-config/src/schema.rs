//! Strongly typed configuration schema.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Transport the server speaks on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited JSON on stdin/stdout.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::UnknownVariant {
                kind: "transport",
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        })
    }
}

/// Log verbosity accepted on the command line and in config files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything including request tracing.
    Debug,
    /// Invocation summaries.
    #[default]
    Info,
    /// Timeouts and rejected calls.
    #[serde(alias = "warn")]
    Warning,
    /// Failures only.
    Error,
    /// Alias of [`LogLevel::Error`].
    Critical,
}

impl LogLevel {
    /// Returns the `tracing` filter directive for this level.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(ConfigError::UnknownVariant {
                kind: "log level",
                value: value.to_owned(),
            }),
        }
    }
}

/// Settings for the upstream ChEMBL web services.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the REST API.
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: f64,
    /// Records requested per data query.
    pub page_limit: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebi.ac.uk/chembl/api/".to_owned(),
            request_timeout_secs: 30.0,
            page_limit: 20,
        }
    }
}

impl UpstreamConfig {
    /// Request timeout as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value is not a positive number.
    pub fn request_timeout(&self) -> ConfigResult<Duration> {
        positive_secs("upstream.request_timeout_secs", self.request_timeout_secs)
    }
}

/// Default invocation deadlines per operation category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeadlineConfig {
    /// Deadline for data-query operations, in seconds.
    pub data_query_secs: f64,
    /// Deadline for utility operations, in seconds.
    pub utility_secs: f64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            data_query_secs: 10.0,
            utility_secs: 5.0,
        }
    }
}

/// Top-level server configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address for the HTTP transport.
    pub host: String,
    /// Bind port for the HTTP transport.
    pub port: u16,
    /// Transport to serve on.
    pub transport: TransportKind,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Maximum number of concurrently executing requests.
    pub max_in_flight: usize,
    /// Upstream client settings.
    pub upstream: UpstreamConfig,
    /// Invocation deadlines.
    pub deadlines: DeadlineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            transport: TransportKind::default(),
            log_level: LogLevel::default(),
            max_in_flight: 32,
            upstream: UpstreamConfig::default(),
            deadlines: DeadlineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Checks every setting for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("port", "must be non-zero"));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::invalid("max_in_flight", "must be at least 1"));
        }
        if self.upstream.page_limit == 0 {
            return Err(ConfigError::invalid("upstream.page_limit", "must be at least 1"));
        }
        let base = self.upstream.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "upstream.base_url",
                format!("`{base}` must use http or https"),
            ));
        }
        self.upstream.request_timeout()?;
        positive_secs("deadlines.data_query_secs", self.deadlines.data_query_secs)?;
        positive_secs("deadlines.utility_secs", self.deadlines.utility_secs)?;
        Ok(())
    }

    /// Socket address string for the HTTP transport.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn positive_secs(field: &'static str, secs: f64) -> ConfigResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("{secs} is not a positive number of seconds"),
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|err| ConfigError::invalid(field, err.to_string()))
}
