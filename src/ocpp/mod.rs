//! OCPP wire taxonomy and typed message sets

pub mod has2be;
pub mod v16;
pub mod v201;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol versions spoken by the central system. OCPP 2.0.1 appears only
/// as the inner namespace of DataTransfer tunnelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OcppVersion {
    #[serde(rename = "ocpp1.6")]
    V16,
    #[serde(rename = "ocpp2.0.1")]
    V201,
}

impl OcppVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V16 => "ocpp1.6",
            Self::V201 => "ocpp2.0.1",
        }
    }
}

impl fmt::Display for OcppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CallError codes surfaced to the far side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Requested action is not known by the receiver.
    NotImplemented,
    /// Requested action is recognized but not supported.
    NotSupported,
    /// Handler or egress validation failed.
    InternalError,
    /// Payload is syntactically correct but violates its schema.
    FormatViolation,
    /// The outer framing is malformed.
    ProtocolError,
    /// Synthesised by the pending-call registry for expired outbound calls.
    Timeout,
    /// Anything that fits no other category.
    GenericError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotImplemented => "NotImplemented",
            Self::NotSupported => "NotSupported",
            Self::InternalError => "InternalError",
            Self::FormatViolation => "FormatViolation",
            Self::ProtocolError => "ProtocolError",
            Self::Timeout => "Timeout",
            Self::GenericError => "GenericError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
