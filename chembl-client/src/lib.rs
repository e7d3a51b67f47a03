//! Collaborators behind the ChEMBL tools.
//!
//! [`traits`] defines the narrow interfaces the tool layer consumes;
//! [`chembl`] implements them against the public ChEMBL REST API.

#![warn(missing_docs, clippy::pedantic)]

pub mod chembl;
pub mod traits;

mod http_client;
