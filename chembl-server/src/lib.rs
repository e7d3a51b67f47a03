//! ChEMBL tool server.
//!
//! Exposes the ChEMBL catalog as JSON-RPC tools over stdio or HTTP. The
//! [`catalog`] turns each row into a registered operation, [`protocol`]
//! frames requests and responses, and [`stdio`] / [`http`] move bytes.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
mod error;
pub mod http;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod stdio;

pub use error::{ServerError, ServerResult};
pub use protocol::{RpcError, RpcResponse, RpcService, SharedService};
pub use scheduler::{RequestScheduler, SchedulerError};
pub use server::{build_default_service, build_service, serve};
