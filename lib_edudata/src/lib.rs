//! # EduData Client Library
//!
//! The data layer behind the EduData management console. It is organised in
//! folder-based modules, each gated by a Cargo feature of the same name:
//!
//! - **`configs`**: layered [`ClientConfig`](configs::ClientConfig) (defaults, JSON file, `EDUDATA_*` env).
//! - **`loggers`**: `tracing` subscriber bootstrap and colored operator notifications.
//! - **`storage`**: durable key-value storage holding the session credential.
//! - **`retrieve`**: the shared [`ApiClient`](retrieve::ky_http::ApiClient) with its
//!   credential and session-expiry interceptors, plus the login flow.
//! - **`resources`**: resource controllers (load, submit, edit, delete, filter) built on
//!   the transport. [`Docente`](resources::docente::Docente) is the shipped resource.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "resources")]
pub mod resources;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "retrieve")]
pub mod session;
#[cfg(feature = "storage")]
pub mod storage;

#[cfg(feature = "configs")]
pub use configs::ClientConfig;
#[cfg(feature = "resources")]
pub use resources::{Docente, DocenteController, DocenteField, ResourceController};
#[cfg(feature = "retrieve")]
pub use retrieve::{ApiClient, TransportError};
#[cfg(feature = "storage")]
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError, TOKEN_KEY, USER_KEY};
