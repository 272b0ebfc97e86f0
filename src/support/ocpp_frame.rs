//! OCPP-J message framing
//!
//! The OCPP-J (JSON over WebSocket) transport envelope is the same across
//! protocol versions:
//!
//! - **Call**       `[2, "<messageId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<messageId>", {<payload>}]`
//! - **CallError**  `[4, "<messageId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`
//!
//! Anything that does not fit this shape is a `ProtocolError` at the router
//! level; payloads are passed through untouched for the schema layer.

use serde_json::Value;
use thiserror::Error;

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

/// A parsed OCPP-J frame (version-agnostic transport envelope).
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    /// `[2, messageId, action, payload]`
    Call {
        message_id: String,
        action: String,
        payload: Value,
    },
    /// `[3, messageId, payload]`
    CallResult { message_id: String, payload: Value },
    /// `[4, messageId, errorCode, errorDescription, errorDetails]`
    CallError {
        message_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

impl OcppFrame {
    /// Parse raw JSON text into an `OcppFrame`.
    pub fn parse(text: &str) -> Result<Self, OcppFrameError> {
        let arr: Vec<Value> =
            serde_json::from_str(text).map_err(|e| OcppFrameError::NotAnArray(e.to_string()))?;

        let msg_type = arr
            .first()
            .and_then(Value::as_u64)
            .ok_or(OcppFrameError::InvalidMessageType)?;

        match msg_type {
            MSG_TYPE_CALL => Self::parse_call(&arr),
            MSG_TYPE_CALL_RESULT => Self::parse_call_result(&arr),
            MSG_TYPE_CALL_ERROR => Self::parse_call_error(&arr),
            _ => Err(OcppFrameError::UnknownMessageType(msg_type)),
        }
    }

    fn parse_message_id(arr: &[Value]) -> Result<String, OcppFrameError> {
        let id = arr
            .get(1)
            .and_then(Value::as_str)
            .ok_or(OcppFrameError::FieldTypeMismatch("messageId must be a string"))?;
        if id.is_empty() {
            return Err(OcppFrameError::EmptyMessageId);
        }
        Ok(id.to_string())
    }

    fn parse_call(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 4 {
            return Err(OcppFrameError::MissingFields {
                expected: 4,
                got: arr.len(),
            });
        }

        let message_id = Self::parse_message_id(arr)?;
        let action = arr[2]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("action must be a string"))?
            .to_string();

        Ok(Self::Call {
            message_id,
            action,
            payload: arr[3].clone(),
        })
    }

    fn parse_call_result(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 3 {
            return Err(OcppFrameError::MissingFields {
                expected: 3,
                got: arr.len(),
            });
        }

        Ok(Self::CallResult {
            message_id: Self::parse_message_id(arr)?,
            payload: arr[2].clone(),
        })
    }

    fn parse_call_error(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 4 {
            return Err(OcppFrameError::MissingFields {
                expected: 4,
                got: arr.len(),
            });
        }

        let message_id = Self::parse_message_id(arr)?;
        let error_code = arr[2]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("errorCode must be a string"))?
            .to_string();
        let error_description = arr
            .get(3)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let error_details = arr
            .get(4)
            .cloned()
            .unwrap_or(Value::Object(Default::default()));

        Ok(Self::CallError {
            message_id,
            error_code,
            error_description,
            error_details,
        })
    }

    /// Serialize this frame to its wire representation.
    pub fn serialize(&self) -> String {
        let arr: Value = match self {
            Self::Call {
                message_id,
                action,
                payload,
            } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL.into()),
                Value::String(message_id.clone()),
                Value::String(action.clone()),
                payload.clone(),
            ]),

            Self::CallResult {
                message_id,
                payload,
            } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL_RESULT.into()),
                Value::String(message_id.clone()),
                payload.clone(),
            ]),

            Self::CallError {
                message_id,
                error_code,
                error_description,
                error_details,
            } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL_ERROR.into()),
                Value::String(message_id.clone()),
                Value::String(error_code.clone()),
                Value::String(error_description.clone()),
                error_details.clone(),
            ]),
        };

        // serde_json::to_string on a Value never fails
        serde_json::to_string(&arr).unwrap()
    }

    /// The correlation id of this frame.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Call { message_id, .. }
            | Self::CallResult { message_id, .. }
            | Self::CallError { message_id, .. } => message_id,
        }
    }
}

/// Errors raised while parsing an OCPP-J frame. All of them surface as
/// `ProtocolError` on the wire.
#[derive(Debug, Error, PartialEq)]
pub enum OcppFrameError {
    #[error("message is not a JSON array: {0}")]
    NotAnArray(String),
    #[error("message type discriminant is missing or not a number")]
    InvalidMessageType,
    #[error("unknown message type: {0}")]
    UnknownMessageType(u64),
    #[error("messageId must be a non-empty string")]
    EmptyMessageId,
    #[error("expected at least {expected} elements, got {got}")]
    MissingFields { expected: usize, got: usize },
    #[error("field type mismatch: {0}")]
    FieldTypeMismatch(&'static str),
}
