//! Layered configuration loading.

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::ServerConfig;

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "CHEMBL_MCP_";

/// Loads defaults, the optional JSON file, then process environment overrides.
///
/// The result is not validated; callers apply their own overrides first and
/// then call [`ServerConfig::validate`].
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if an
/// environment variable carries an unusable value.
pub fn load(path: Option<&Path>) -> ConfigResult<ServerConfig> {
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => ServerConfig::default(),
    };
    apply_env(&mut config, std::env::vars())?;
    Ok(config)
}

/// Reads a JSON configuration file. Missing fields take their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn from_file(path: &Path) -> ConfigResult<ServerConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Applies `CHEMBL_MCP_*` overrides from `vars`. Unrelated variables are ignored.
///
/// # Errors
///
/// Returns [`ConfigError::Environment`] for values that fail to parse.
pub fn apply_env<I, K, V>(config: &mut ServerConfig, vars: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in vars {
        let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let variable = key.as_ref();
        let value = value.as_ref();
        match name {
            "HOST" => config.host = value.to_owned(),
            "PORT" => config.port = parse(variable, value)?,
            "TRANSPORT" => config.transport = parse(variable, value)?,
            "LOG_LEVEL" => config.log_level = parse(variable, value)?,
            "MAX_IN_FLIGHT" => config.max_in_flight = parse(variable, value)?,
            "BASE_URL" => config.upstream.base_url = value.to_owned(),
            "REQUEST_TIMEOUT" => config.upstream.request_timeout_secs = parse(variable, value)?,
            "PAGE_LIMIT" => config.upstream.page_limit = parse(variable, value)?,
            "DATA_QUERY_DEADLINE" => config.deadlines.data_query_secs = parse(variable, value)?,
            "UTILITY_DEADLINE" => config.deadlines.utility_secs = parse(variable, value)?,
            _ => {
                debug!(variable, "ignoring unknown environment override");
                continue;
            }
        }
        debug!(variable, "applied environment override");
    }
    Ok(())
}

fn parse<T>(variable: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::Environment {
            variable: variable.to_owned(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LogLevel, TransportKind};

    #[test]
    fn env_overrides_apply_by_name() {
        let mut config = ServerConfig::default();
        apply_env(
            &mut config,
            [
                ("CHEMBL_MCP_PORT", "9100"),
                ("CHEMBL_MCP_TRANSPORT", "http"),
                ("CHEMBL_MCP_LOG_LEVEL", "debug"),
                ("CHEMBL_MCP_UTILITY_DEADLINE", "2.5"),
                ("PATH", "/usr/bin"),
            ],
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.transport, TransportKind::Http);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!((config.deadlines.utility_secs - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let mut config = ServerConfig::default();
        let err = apply_env(&mut config, [("CHEMBL_MCP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Environment { ref variable, .. } if variable == "CHEMBL_MCP_PORT"
        ));
    }
}
