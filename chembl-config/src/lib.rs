//! Configuration for the ChEMBL tool server.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `CHEMBL_MCP_*` environment variables. Command-line flags are applied last
//! by the binary.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{DeadlineConfig, LogLevel, ServerConfig, TransportKind, UpstreamConfig};
