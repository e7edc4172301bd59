//! # Data Retrieval Module
//!
//! The single HTTP transport shared by every resource controller.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: [`ApiClient`], a `reqwest-middleware` client bound to one base
//!   address with a fixed timeout, exposing GET/POST/PUT/DELETE with JSON bodies.
//! - **`interceptors`**: the outbound [`BearerAuth`] stage (attach the stored
//!   credential) and the inbound [`SessionGuard`] stage (evict it on `401`).
//! - **`error`**: [`TransportError`] and the message normalization every caller sees.

#![forbid(unsafe_code)]

/// Normalized transport errors.
pub mod error;
/// Request/response interception stages.
pub mod interceptors;
/// Generic HTTP API client with credential and session middleware.
pub mod ky_http;

pub use error::*;
pub use interceptors::*;
pub use ky_http::*;
