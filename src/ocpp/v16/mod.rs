//! OCPP 1.6 typed messages
//!
//! Hand-maintained request/response pairs for the actions the central system
//! implements, mirroring the field names of the official OCPP 1.6J schemas.

mod messages;
mod types;

pub use messages::*;
pub use types::*;
