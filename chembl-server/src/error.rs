use std::io;
use std::net::SocketAddr;

use chembl_client::traits::ClientError;
use chembl_config::ConfigError;
use chembl_tools::RegistryError;
use thiserror::Error;

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog could not be registered.
    #[error("failed to build operation registry: {0}")]
    Registry(#[from] RegistryError),

    /// The upstream client could not be configured.
    #[error("failed to configure upstream client: {0}")]
    Client(#[from] ClientError),

    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("http server on {addr} failed: {source}")]
    Http {
        /// Address being served.
        addr: SocketAddr,
        /// Underlying failure.
        #[source]
        source: hyper::Error,
    },

    /// Reading or writing a stream failed.
    #[error("stream io failed: {0}")]
    Io(#[from] io::Error),
}
