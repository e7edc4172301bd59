//! # Configuration Modules
//!
//! This module aggregates the configuration of the transport layer.

/// Layered client configuration: defaults, optional JSON file, `EDUDATA_*` environment.
pub mod config_client;

pub use config_client::*;
