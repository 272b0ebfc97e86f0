//! Cross-cutting utilities

pub mod clock;
pub mod ocpp_frame;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ocpp_frame::{OcppFrame, OcppFrameError};
