//! # gridwave-csms
//!
//! Central-system core of an OCPP 1.6J charging station management system,
//! with OCPP 2.0.1 / ISO 15118 plug-and-charge actions tunnelled through
//! DataTransfer.
//!
//! ## Architecture
//!
//! - **support**: OCPP-J framing, clock abstraction
//! - **schema**: JSON Schema registry over an abstract file tree
//! - **ocpp**: typed message sets (1.6, tunnelled 2.0.1 subset, has2be)
//! - **router**: schema-gated dispatch, pending-call correlation, call makers
//! - **handlers**: per-action protocol logic
//! - **store**: narrow persistence ports plus the in-memory engine
//! - **services**: ISO 15118 PKI ports
//! - **session** / **server**: connection registry and WebSocket endpoint
//! - **config**: TOML configuration

pub mod config;
pub mod handlers;
pub mod ocpp;
pub mod router;
pub mod schema;
pub mod server;
pub mod services;
pub mod session;
pub mod store;
pub mod support;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::AppConfig;
pub use router::{Emitter, Router};
pub use session::SessionManager;
