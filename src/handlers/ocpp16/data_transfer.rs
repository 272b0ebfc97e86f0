//! DataTransfer sub-router
//!
//! DataTransfer carries nested actions addressed by `(vendorId, messageId)`;
//! the `data` field holds the inner payload as a JSON-encoded string. Both
//! directions re-enter the standard route pipeline (schema validation, typed
//! dispatch) with a second-level routing table instead of duplicating it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::ocpp::v16;
use crate::router::{CallHandler, CallResultHandler, CallResultRoute, CallRoute, HandlerError};
use crate::schema::{SchemaRegistry, ValidateError};

/// Nested routing table: vendor id → message id → route.
pub type DataTransferCallRoutes = HashMap<String, HashMap<String, CallRoute>>;
pub type DataTransferResultRoutes = HashMap<String, HashMap<String, CallResultRoute>>;

pub struct DataTransferHandler {
    pub schemas: Arc<SchemaRegistry>,
    pub call_routes: DataTransferCallRoutes,
}

#[async_trait]
impl CallHandler for DataTransferHandler {
    type Request = v16::DataTransferRequest;
    type Response = v16::DataTransferResponse;

    async fn handle_call(
        &self,
        charge_station_id: &str,
        request: Self::Request,
    ) -> Result<Self::Response, HandlerError> {
        let Some(vendor_routes) = self.call_routes.get(&request.vendor_id) else {
            warn!(
                charge_station_id,
                vendor_id = request.vendor_id.as_str(),
                "data transfer for unknown vendor"
            );
            return Ok(v16::DataTransferResponse {
                status: v16::DataTransferStatus::UnknownVendorId,
                data: None,
            });
        };

        let route = request
            .message_id
            .as_ref()
            .and_then(|message_id| vendor_routes.get(message_id));
        let Some(route) = route else {
            warn!(
                charge_station_id,
                vendor_id = request.vendor_id.as_str(),
                message_id = request.message_id.as_deref().unwrap_or(""),
                "data transfer for unknown message"
            );
            return Ok(v16::DataTransferResponse {
                status: v16::DataTransferStatus::UnknownMessageId,
                data: None,
            });
        };

        let payload = decode_inner(request.data.as_deref())?;
        if let Err(e) = self.schemas.validate(route.request_schema(), &payload) {
            return Err(validate_error("request", e));
        }

        let response = route.invoke(charge_station_id, &payload).await?;

        if let Err(e) = self.schemas.validate(route.response_schema(), &response) {
            return Err(validate_error("response", e));
        }

        Ok(v16::DataTransferResponse {
            status: v16::DataTransferStatus::Accepted,
            data: Some(serde_json::to_string(&response).map_err(|e| {
                HandlerError::Message(format!("encoding nested response: {e}"))
            })?),
        })
    }
}

/// Correlates DataTransfer CallResults back to the nested action that was
/// sent. The `(vendorId, messageId)` pair is recovered from the original
/// outbound envelope held in the pending-call entry.
pub struct DataTransferResultHandler {
    pub schemas: Arc<SchemaRegistry>,
    pub call_result_routes: DataTransferResultRoutes,
}

#[async_trait]
impl CallResultHandler for DataTransferResultHandler {
    type Request = v16::DataTransferRequest;
    type Response = v16::DataTransferResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        state: Option<Value>,
    ) -> Result<(), HandlerError> {
        let route = self
            .call_result_routes
            .get(&request.vendor_id)
            .and_then(|vendor_routes| {
                request
                    .message_id
                    .as_ref()
                    .and_then(|message_id| vendor_routes.get(message_id))
            });
        let Some(route) = route else {
            warn!(
                charge_station_id,
                vendor_id = request.vendor_id.as_str(),
                message_id = request.message_id.as_deref().unwrap_or(""),
                "data transfer result for unknown nested action"
            );
            return Ok(());
        };

        if response.status != v16::DataTransferStatus::Accepted {
            warn!(
                charge_station_id,
                vendor_id = request.vendor_id.as_str(),
                message_id = request.message_id.as_deref().unwrap_or(""),
                status = ?response.status,
                "charge station rejected data transfer"
            );
            return Ok(());
        }

        let inner_request = decode_inner(request.data.as_deref())?;
        let inner_response = decode_inner(response.data.as_deref())?;

        if let Err(e) = self.schemas.validate(route.response_schema(), &inner_response) {
            return Err(validate_error("nested response", e));
        }

        route
            .invoke(charge_station_id, &inner_request, &inner_response, state)
            .await
    }
}

fn decode_inner(data: Option<&str>) -> Result<Value, HandlerError> {
    match data {
        Some(data) => serde_json::from_str(data)
            .map_err(|e| HandlerError::Message(format!("nested payload is not valid JSON: {e}"))),
        None => Ok(Value::Object(Default::default())),
    }
}

fn validate_error(what: &str, e: ValidateError) -> HandlerError {
    HandlerError::Message(format!("nested {what} failed validation: {e}"))
}
