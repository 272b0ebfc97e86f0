//! TriggerMessage result handler

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::ocpp::v16;
use crate::router::{CallResultHandler, HandlerError};

pub struct TriggerMessageResultHandler;

#[async_trait]
impl CallResultHandler for TriggerMessageResultHandler {
    type Request = v16::TriggerMessageRequest;
    type Response = v16::TriggerMessageResponse;

    async fn handle_call_result(
        &self,
        charge_station_id: &str,
        request: Self::Request,
        response: Self::Response,
        _state: Option<Value>,
    ) -> Result<(), HandlerError> {
        info!(
            charge_station_id,
            "trigger_message.requested" = ?request.requested_message,
            "trigger_message.status" = ?response.status,
            "trigger message answered"
        );
        Ok(())
    }
}
